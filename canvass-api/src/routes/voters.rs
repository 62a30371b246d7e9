/// Voter endpoints
///
/// # Endpoints
///
/// - `GET  /v1/voters` - Scoped, filtered, paginated listing
/// - `POST /v1/voters` - Register one voter
/// - `POST /v1/voters/:id/voting-status` - Flip voting status (pillar role)
/// - `POST /v1/voters/:id/card-status` - Flip card status (pillar role)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use canvass_shared::{
    auth::middleware::AuthContext,
    models::{
        pillar::Pillar,
        user::Role,
        voter::{CardStatus, CreateVoter, Voter, VoterFilter, VotingStatus},
    },
    pagination::Page,
    scope::Scope,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Page size for voter listings
const VOTERS_PER_PAGE: i64 = 50;

/// Query parameters accepted by voter listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoterQuery {
    /// Substring match over name, voter number and phone
    pub search: Option<String>,

    pub governorate: Option<String>,
    pub district: Option<String>,
    pub sub_district: Option<String>,

    /// Card status token (canonical or Arabic)
    pub card_status: Option<String>,

    /// Voting status token (canonical or Arabic)
    pub voting_status: Option<String>,

    /// 1-based page number
    pub page: Option<i64>,
}

impl VoterQuery {
    /// Converts query parameters into a model filter
    ///
    /// Status tokens accept the same canonical and Arabic forms as the
    /// update endpoints; an unknown token is a client error, not an empty
    /// filter.
    pub fn to_filter(&self) -> Result<VoterFilter, ApiError> {
        let card_status = self
            .card_status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                CardStatus::from_token(s)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown card status: {}", s)))
            })
            .transpose()?;

        let voting_status = self
            .voting_status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                VotingStatus::from_token(s)
                    .ok_or_else(|| ApiError::BadRequest(format!("Unknown voting status: {}", s)))
            })
            .transpose()?;

        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(VoterFilter {
            search: text(&self.search),
            governorate: text(&self.governorate),
            district: text(&self.district),
            sub_district: text(&self.sub_district),
            card_status,
            voting_status,
        })
    }

    /// Requested page, defaulting to the first
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// Create voter request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVoterRequest {
    #[validate(length(min = 1, max = 50, message = "Voter number is required"))]
    pub voter_number: String,

    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "Governorate is required"))]
    pub governorate: String,

    #[validate(length(min = 1, max = 100, message = "District is required"))]
    pub district: String,

    #[serde(default)]
    pub sub_district: String,

    /// Card status token, defaults to not updated
    pub card_status: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Center name is required"))]
    pub center_name: String,

    #[validate(length(min = 1, max = 50, message = "Center number is required"))]
    pub center_number: String,

    #[validate(length(min = 1, max = 100, message = "Station is required"))]
    pub station: String,

    pub phone: Option<String>,

    /// Target pillar; required unless the caller is a pillar account, which
    /// always registers into its own roster
    pub pillar_id: Option<Uuid>,
}

/// Status update request, shared by both status endpoints
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// Status token, canonical or Arabic
    pub status: String,
}

/// Lists voters in the caller's scope
///
/// # Endpoint
///
/// ```text
/// GET /v1/voters?search=&district=&card_status=&voting_status=&page=1
/// ```
pub async fn list_voters(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<VoterQuery>,
) -> ApiResult<Json<Page<Voter>>> {
    let scope = Scope::for_requester(&state.db, &auth).await?;
    let filter = query.to_filter()?;

    let page = Voter::list(&state.db, &scope, &filter, query.page(), VOTERS_PER_PAGE).await?;

    Ok(Json(page))
}

/// Registers a single voter
///
/// A pillar account always registers into its own roster. Other roles must
/// name a pillar, which is resolved inside their scope so a pillar outside
/// the caller's subtree reads as nonexistent.
///
/// # Errors
///
/// - `404 Not Found`: Named pillar doesn't exist in the caller's scope
/// - `409 Conflict`: Duplicate voter number
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_voter(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateVoterRequest>,
) -> ApiResult<Json<Voter>> {
    req.validate()?;

    let pillar_id = resolve_target_pillar(&state, &auth, req.pillar_id).await?;

    let card_status = match req.card_status.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(token) => CardStatus::from_token(token)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown card status: {}", token)))?,
        None => CardStatus::NotUpdated,
    };

    let voter = Voter::create(
        &state.db,
        CreateVoter {
            voter_number: req.voter_number,
            name: req.name,
            governorate: req.governorate,
            district: req.district,
            sub_district: req.sub_district,
            card_status,
            center_name: req.center_name,
            center_number: req.center_number,
            station: req.station,
            phone: req.phone,
            pillar_id,
        },
    )
    .await?;

    Ok(Json(voter))
}

/// Flips the voting status of one voter
///
/// Only pillar accounts track voting, and only for their own roster.
///
/// # Endpoint
///
/// ```text
/// POST /v1/voters/:id/voting-status
/// Content-Type: application/json
///
/// { "status": "صوت" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a pillar account
/// - `404 Not Found`: Voter doesn't exist or belongs to another pillar
/// - `422 Unprocessable Entity`: Unknown status token (nothing is mutated)
pub async fn update_voting_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let pillar = require_own_pillar(&state, &auth).await?;

    let status = VotingStatus::from_token(&req.status).ok_or_else(|| {
        ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
            field: "status".to_string(),
            message: format!("Unknown voting status: {}", req.status),
        }])
    })?;

    let updated = Voter::update_voting_status(&state.db, id, pillar.id, status).await?;
    if !updated {
        return Err(ApiError::NotFound("Voter not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Flips the card status of one voter
///
/// Same contract as [`update_voting_status`] but for the registration card.
pub async fn update_card_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let pillar = require_own_pillar(&state, &auth).await?;

    let status = CardStatus::from_token(&req.status).ok_or_else(|| {
        ApiError::ValidationError(vec![crate::error::ValidationErrorDetail {
            field: "status".to_string(),
            message: format!("Unknown card status: {}", req.status),
        }])
    })?;

    let updated = Voter::update_card_status(&state.db, id, pillar.id, status).await?;
    if !updated {
        return Err(ApiError::NotFound("Voter not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Resolves the pillar a new voter should be attached to
///
/// Pillar callers use their own pillar and may not name another one. Other
/// roles must name a pillar inside their scope.
pub(crate) async fn resolve_target_pillar(
    state: &AppState,
    auth: &AuthContext,
    requested: Option<Uuid>,
) -> Result<Uuid, ApiError> {
    if auth.role == Role::Pillar {
        let pillar = require_own_pillar(state, auth).await?;
        if requested.is_some_and(|id| id != pillar.id) {
            return Err(ApiError::Forbidden(
                "Pillar accounts can only manage their own roster".to_string(),
            ));
        }
        return Ok(pillar.id);
    }

    let pillar_id =
        requested.ok_or_else(|| ApiError::BadRequest("pillar_id is required".to_string()))?;

    let scope = Scope::for_requester(&state.db, auth).await?;
    let pillar = Pillar::find_in_scope(&state.db, pillar_id, &scope)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pillar not found".to_string()))?;

    Ok(pillar.id)
}

/// The caller's own pillar profile, or 403/404
pub(crate) async fn require_own_pillar(
    state: &AppState,
    auth: &AuthContext,
) -> Result<Pillar, ApiError> {
    if !auth.role.can_update_voter_status() {
        return Err(ApiError::Forbidden(
            "Only pillar accounts can update voter status".to_string(),
        ));
    }

    Pillar::find_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No pillar profile for this account".to_string()))
}
