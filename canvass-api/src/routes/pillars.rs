/// Pillar management endpoints
///
/// Candidates create pillars under their own candidacy; admins may create
/// under any candidate. Listing follows the caller's scope.
///
/// # Endpoints
///
/// - `GET  /v1/pillars` - Pillars visible to the caller, with voter counts
/// - `POST /v1/pillars` - Create pillar + backing user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use canvass_shared::{
    auth::middleware::AuthContext,
    models::{
        candidate::Candidate,
        pillar::{CreatePillar, Pillar, PillarListItem},
        user::Role,
    },
    scope::{ResourceKind, Scope},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create pillar request
///
/// `candidate_id` is admin-only: candidate callers always create under
/// their own candidacy.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePillarRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 200, message = "Full name is required"))]
    pub full_name: String,

    pub phone: Option<String>,

    pub candidate_id: Option<Uuid>,
}

/// Lists pillars in the caller's scope with voter counts
pub async fn list_pillars(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PillarListItem>>> {
    if !ResourceKind::Pillars.visible_to(auth.role) {
        return Err(ApiError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let scope = Scope::for_requester(&state.db, &auth).await?;

    Ok(Json(Pillar::list_in_scope(&state.db, &scope).await?))
}

/// Creates a pillar together with its backing user account
///
/// # Errors
///
/// - `400 Bad Request`: Admin didn't name a candidate
/// - `403 Forbidden`: Caller may not add pillars
/// - `404 Not Found`: Named candidate doesn't exist
/// - `409 Conflict`: Username already taken
pub async fn create_pillar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreatePillarRequest>,
) -> ApiResult<Json<Pillar>> {
    if !auth.role.can_add_pillars() {
        return Err(ApiError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }
    req.validate()?;

    let candidate_id = match auth.role {
        Role::Admin => {
            let id = req
                .candidate_id
                .ok_or_else(|| ApiError::BadRequest("candidate_id is required".to_string()))?;
            Candidate::find_by_id(&state.db, id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Candidate not found".to_string()))?
                .id
        }
        _ => {
            if req.candidate_id.is_some() {
                return Err(ApiError::Forbidden(
                    "Candidate accounts create pillars under their own candidacy".to_string(),
                ));
            }
            Candidate::find_by_user(&state.db, auth.user_id)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| {
                    ApiError::NotFound("No candidate profile for this account".to_string())
                })?
        }
    };

    let password_hash = canvass_shared::auth::password::hash_password(&req.password)?;

    let pillar = Pillar::create_with_user(
        &state.db,
        CreatePillar {
            username: req.username,
            password_hash,
            full_name: req.full_name,
            phone: req.phone,
            candidate_id,
        },
    )
    .await?;

    Ok(Json(pillar))
}
