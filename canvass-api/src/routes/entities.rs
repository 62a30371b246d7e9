/// Entity management endpoints (admin only)
///
/// # Endpoints
///
/// - `GET    /v1/entities` - Paginated listing with search
/// - `POST   /v1/entities` - Create entity + backing user
/// - `PUT    /v1/entities/:id` - Update entity and contact details
/// - `DELETE /v1/entities/:id` - Delete entity, cascading through its subtree

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use canvass_shared::{
    auth::{middleware::AuthContext, password},
    models::entity::{CreateEntity, Entity, EntityListItem},
    pagination::Page,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Page size for management listings
const MANAGE_PER_PAGE: i64 = 10;

/// Listing query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
}

/// Create entity request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntityRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,

    pub phone: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Entity name is required"))]
    pub name: String,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

/// Update entity request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEntityRequest {
    #[validate(length(min = 1, max = 200, message = "Entity name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,

    pub phone: Option<String>,
}

/// Lists entities with candidate counts, newest first
pub async fn list_entities(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<EntityListItem>>> {
    if !auth.role.can_manage_entities() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let page = Entity::list(
        &state.db,
        query.search.as_deref().filter(|s| !s.trim().is_empty()),
        query.page.unwrap_or(1),
        MANAGE_PER_PAGE,
    )
    .await?;

    Ok(Json(page))
}

/// Creates an entity together with its backing user account
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `409 Conflict`: Username already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_entity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEntityRequest>,
) -> ApiResult<Json<Entity>> {
    if !auth.role.can_manage_entities() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let entity = Entity::create_with_user(
        &state.db,
        CreateEntity {
            username: req.username,
            password_hash,
            full_name: req.full_name,
            phone: req.phone,
            name: req.name,
            logo_url: req.logo_url,
        },
    )
    .await?;

    Ok(Json(entity))
}

/// Updates an entity's name and its user's contact details
pub async fn update_entity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEntityRequest>,
) -> ApiResult<Json<Entity>> {
    if !auth.role.can_manage_entities() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }
    req.validate()?;

    let entity = Entity::update(&state.db, id, &req.name, &req.full_name, req.phone.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Entity not found".to_string()))?;

    Ok(Json(entity))
}

/// Deletes an entity
///
/// Deleting the backing user cascades through the entity, its candidates,
/// their pillars and every voter below.
pub async fn delete_entity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    if !auth.role.can_manage_entities() {
        return Err(ApiError::Forbidden("Insufficient permissions".to_string()));
    }

    let entity = Entity::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Entity not found".to_string()))?;

    canvass_shared::models::user::User::delete(&state.db, entity.user_id).await?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}
