/// Candidate management endpoints
///
/// Admins manage candidates anywhere; entity accounts manage the candidates
/// of their own entity. A candidate named from outside the caller's scope
/// answers 404, never 403.
///
/// # Endpoints
///
/// - `GET    /v1/candidates` - Paginated listing with search
/// - `POST   /v1/candidates` - Create candidate + backing user
/// - `PUT    /v1/candidates/:id` - Update candidate (admin)
/// - `DELETE /v1/candidates/:id` - Delete candidate (admin)
/// - `GET    /v1/candidates/:id/pillars` - Pillars of one candidate

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::entities::ListQuery,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use canvass_shared::{
    auth::{authorization::require_role, middleware::AuthContext, password},
    models::{
        candidate::{Candidate, CandidateListItem, CreateCandidate},
        entity::Entity,
        pillar::{Pillar, PillarListItem},
        user::Role,
    },
    pagination::Page,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

const MANAGE_PER_PAGE: i64 = 10;

/// Create candidate request
///
/// `entity_id` is admin-only: entity callers always create under their own
/// entity and may not name one.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCandidateRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,

    pub phone: Option<String>,

    pub entity_id: Option<Uuid>,

    #[validate(url(message = "Profile image URL must be a valid URL"))]
    pub profile_image_url: Option<String>,
}

/// Update candidate request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCandidateRequest {
    pub entity_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,

    pub phone: Option<String>,
}

/// Lists candidates in the caller's scope
pub async fn list_candidates(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<CandidateListItem>>> {
    let entity_id = scope_entity(&state, &auth).await?;

    let page = Candidate::list(
        &state.db,
        entity_id,
        query.search.as_deref().filter(|s| !s.trim().is_empty()),
        query.page.unwrap_or(1),
        MANAGE_PER_PAGE,
    )
    .await?;

    Ok(Json(page))
}

/// Creates a candidate together with its backing user account
///
/// # Errors
///
/// - `400 Bad Request`: Admin didn't name an entity
/// - `403 Forbidden`: Caller may not add candidates
/// - `404 Not Found`: Named entity doesn't exist
/// - `409 Conflict`: Username already taken
pub async fn create_candidate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCandidateRequest>,
) -> ApiResult<Json<Candidate>> {
    if !auth.role.can_add_candidates() {
        return Err(ApiError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }
    req.validate()?;

    let entity_id = match auth.role {
        Role::Admin => {
            let id = req
                .entity_id
                .ok_or_else(|| ApiError::BadRequest("entity_id is required".to_string()))?;
            Entity::find_by_id(&state.db, id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Entity not found".to_string()))?
                .id
        }
        _ => {
            if req.entity_id.is_some() {
                return Err(ApiError::Forbidden(
                    "Entity accounts create candidates under their own entity".to_string(),
                ));
            }
            own_entity(&state, &auth).await?
        }
    };

    let password_hash = password::hash_password(&req.password)?;

    let candidate = Candidate::create_with_user(
        &state.db,
        CreateCandidate {
            username: req.username,
            password_hash,
            full_name: req.full_name,
            phone: req.phone,
            entity_id,
            profile_image_url: req.profile_image_url,
        },
    )
    .await?;

    Ok(Json(candidate))
}

/// Updates a candidate's entity assignment and contact details (admin)
pub async fn update_candidate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCandidateRequest>,
) -> ApiResult<Json<Candidate>> {
    require_role(&auth, Role::Admin)?;
    req.validate()?;

    Entity::find_by_id(&state.db, req.entity_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Entity not found".to_string()))?;

    let candidate = Candidate::update(
        &state.db,
        id,
        req.entity_id,
        &req.full_name,
        req.phone.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Candidate not found".to_string()))?;

    Ok(Json(candidate))
}

/// Deletes a candidate (admin)
///
/// Cascades through the candidate's pillars and their voters.
pub async fn delete_candidate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    require_role(&auth, Role::Admin)?;

    let candidate = Candidate::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Candidate not found".to_string()))?;

    canvass_shared::models::user::User::delete(&state.db, candidate.user_id).await?;

    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Lists the pillars of one candidate, with voter counts
pub async fn list_candidate_pillars(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PillarListItem>>> {
    let candidate = match scope_entity(&state, &auth).await? {
        None => Candidate::find_by_id(&state.db, id).await?,
        Some(entity_id) => Candidate::find_in_entity(&state.db, id, entity_id).await?,
    }
    .ok_or_else(|| ApiError::NotFound("Candidate not found".to_string()))?;

    Ok(Json(
        Pillar::list_by_candidate(&state.db, candidate.id).await?,
    ))
}

/// The entity the caller's candidate queries are restricted to
///
/// `None` means unrestricted (admin). Non-admin, non-entity roles are
/// refused.
async fn scope_entity(state: &AppState, auth: &AuthContext) -> Result<Option<Uuid>, ApiError> {
    match auth.role {
        Role::Admin => Ok(None),
        Role::Entity => Ok(Some(own_entity(state, auth).await?)),
        _ => Err(ApiError::Forbidden("Insufficient permissions".to_string())),
    }
}

/// The caller's own entity profile ID
async fn own_entity(state: &AppState, auth: &AuthContext) -> Result<Uuid, ApiError> {
    Entity::find_by_user(&state.db, auth.user_id)
        .await?
        .map(|e| e.id)
        .ok_or_else(|| ApiError::NotFound("No entity profile for this account".to_string()))
}
