/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use canvass_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use canvass_shared::auth::middleware::{self, AuthContext};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// ├── /v1/
/// │   ├── /auth/
/// │   │   ├── POST /login              # Credentials -> tokens (public)
/// │   │   └── POST /refresh            # Refresh access token (public)
/// │   ├── GET  /appearance             # Active theme (public)
/// │   ├── PUT  /appearance             # Replace theme (admin)
/// │   ├── GET  /dashboard/:role        # Role-specific dashboards
/// │   ├── /voters/
/// │   │   ├── GET  /                   # Scoped, filtered listing
/// │   │   ├── POST /                   # Register one voter
/// │   │   ├── POST /:id/voting-status  # Flip voting status (pillar)
/// │   │   └── POST /:id/card-status    # Flip card status (pillar)
/// │   ├── GET  /statistics/:stat_type  # Scoped listing per statistic
/// │   ├── /entities/                   # CRUD (admin)
/// │   ├── /candidates/                 # CRUD (admin/entity)
/// │   ├── /pillars/                    # Create + list (candidate)
/// │   ├── POST /import/voters          # Voter sheet import (entity/candidate)
/// │   └── POST /import/candidates      # Candidate sheet import (entity)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // The theme is read before login renders, so GET stays public. The PUT
    // handler authenticates inline because the two methods share a path.
    let appearance_routes = Router::new().route(
        "/appearance",
        get(routes::appearance::get_theme).put(routes::appearance::update_theme),
    );

    let dashboard_routes = Router::new()
        .route("/dashboard/admin", get(routes::dashboards::admin))
        .route("/dashboard/entity", get(routes::dashboards::entity))
        .route("/dashboard/candidate", get(routes::dashboards::candidate))
        .route("/dashboard/pillar", get(routes::dashboards::pillar));

    let voter_routes = Router::new()
        .route(
            "/",
            get(routes::voters::list_voters).post(routes::voters::create_voter),
        )
        .route(
            "/:id/voting-status",
            post(routes::voters::update_voting_status),
        )
        .route("/:id/card-status", post(routes::voters::update_card_status));

    let statistics_routes = Router::new().route(
        "/:stat_type",
        get(routes::statistics::statistic_detail),
    );

    let entity_routes = Router::new()
        .route(
            "/",
            get(routes::entities::list_entities).post(routes::entities::create_entity),
        )
        .route(
            "/:id",
            put(routes::entities::update_entity).delete(routes::entities::delete_entity),
        );

    let candidate_routes = Router::new()
        .route(
            "/",
            get(routes::candidates::list_candidates).post(routes::candidates::create_candidate),
        )
        .route(
            "/:id",
            put(routes::candidates::update_candidate)
                .delete(routes::candidates::delete_candidate),
        )
        .route("/:id/pillars", get(routes::candidates::list_candidate_pillars));

    let pillar_routes = Router::new().route(
        "/",
        get(routes::pillars::list_pillars).post(routes::pillars::create_pillar),
    );

    let import_routes = Router::new()
        .route("/voters", post(routes::import::import_voters))
        .route("/candidates", post(routes::import::import_candidates));

    // Everything below requires a valid access token
    let protected_routes = Router::new()
        .merge(dashboard_routes)
        .nest("/voters", voter_routes)
        .nest("/statistics", statistics_routes)
        .nest("/entities", entity_routes)
        .nest("/candidates", candidate_routes)
        .nest("/pillars", pillar_routes)
        .nest("/import", import_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(appearance_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Authenticates a request from its headers
///
/// Used by the middleware layer below and directly by handlers that live on
/// a path shared with a public method, where the layer can't be applied
/// per-method.
pub(crate) fn authenticate(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<AuthContext, crate::error::ApiError> {
    Ok(middleware::authenticate_headers(headers, state.jwt_secret())?)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the JWT from the Authorization header, then
/// injects an [`AuthContext`] into request extensions.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(&state, req.headers())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
