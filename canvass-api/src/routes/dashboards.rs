/// Role-specific dashboard endpoints
///
/// Each role has its own dashboard path and payload, bundling what that
/// role's landing page renders so the client needs a single round trip.
/// Calling another role's dashboard is refused.
///
/// # Endpoints
///
/// - `GET /v1/dashboard/admin` - System-wide overview
/// - `GET /v1/dashboard/entity` - Own subtree stats + candidate breakdown
/// - `GET /v1/dashboard/candidate` - Own subtree stats + pillar list
/// - `GET /v1/dashboard/pillar` - Own roster with stats and filters

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::voters::VoterQuery,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use canvass_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    models::{
        candidate::{Candidate, CandidateListItem},
        entity::{Entity, EntityListItem},
        pillar::{Pillar, PillarListItem},
        user::Role,
        voter::{GeoColumn, Voter},
    },
    pagination::Page,
    scope::Scope,
    stats::{self, CandidateTotals, ScopeStats},
};
use serde::Serialize;

/// Page size for the pillar dashboard roster
const ROSTER_PER_PAGE: i64 = 25;

/// How many recent records the admin overview shows
const RECENT_LIMIT: i64 = 5;

/// System-wide overview for admins
#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub entities_count: i64,
    pub candidates_count: i64,
    pub pillars_count: i64,
    pub voters_count: i64,
    pub voted: i64,
    pub not_voted: i64,

    /// Share of all voters who voted, rounded to two decimals
    pub voting_percentage: f64,

    /// Most recently created entities
    pub recent_entities: Vec<EntityListItem>,

    /// Most recently created candidates
    pub recent_candidates: Vec<CandidateListItem>,
}

/// Entity overview: own subtree stats plus a per-candidate breakdown
#[derive(Debug, Serialize)]
pub struct EntityDashboard {
    pub stats: ScopeStats,
    pub candidates_count: i64,
    pub candidates: Vec<CandidateTotals>,
}

/// Candidate overview: own subtree stats plus the pillar list
#[derive(Debug, Serialize)]
pub struct CandidateDashboard {
    pub stats: ScopeStats,
    pub pillars: Vec<PillarListItem>,
}

/// Pillar working view: stats plus the filterable roster it canvasses from
#[derive(Debug, Serialize)]
pub struct PillarDashboard {
    pub stats: ScopeStats,
    pub voters: Page<Voter>,

    /// Distinct values for the filter dropdowns
    pub governorates: Vec<String>,
    pub districts: Vec<String>,
    pub sub_districts: Vec<String>,
}

/// Admin dashboard handler
pub async fn admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<AdminDashboard>> {
    require_role(&auth, Role::Admin)?;

    let totals = stats::voter_totals(&state.db, &Scope::Global).await?;

    Ok(Json(AdminDashboard {
        entities_count: Entity::count(&state.db).await?,
        candidates_count: Candidate::count(&state.db).await?,
        pillars_count: Pillar::count(&state.db).await?,
        voters_count: totals.total,
        voted: totals.voted,
        not_voted: totals.not_voted,
        voting_percentage: stats::percentage2(totals.voted, totals.total),
        recent_entities: Entity::recent(&state.db, RECENT_LIMIT).await?,
        recent_candidates: Candidate::recent(&state.db, RECENT_LIMIT).await?,
    }))
}

/// Entity dashboard handler
pub async fn entity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<EntityDashboard>> {
    require_role(&auth, Role::Entity)?;

    let scope = Scope::for_requester(&state.db, &auth).await?;
    let Scope::Entity(entity_id) = scope else {
        // for_requester only hands an entity scope to entity accounts
        return Err(ApiError::InternalError(
            "Scope resolution mismatch".to_string(),
        ));
    };

    let candidates = stats::candidate_breakdown(&state.db, entity_id).await?;

    Ok(Json(EntityDashboard {
        stats: stats::scope_stats(&state.db, &scope).await?,
        candidates_count: candidates.len() as i64,
        candidates,
    }))
}

/// Candidate dashboard handler
pub async fn candidate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<CandidateDashboard>> {
    require_role(&auth, Role::Candidate)?;

    let scope = Scope::for_requester(&state.db, &auth).await?;
    let Scope::Candidate(candidate_id) = scope else {
        return Err(ApiError::InternalError(
            "Scope resolution mismatch".to_string(),
        ));
    };

    Ok(Json(CandidateDashboard {
        stats: stats::scope_stats(&state.db, &scope).await?,
        pillars: Pillar::list_by_candidate(&state.db, candidate_id).await?,
    }))
}

/// Pillar dashboard handler
///
/// Accepts the same filter query parameters as the voter listing; they
/// narrow the roster but never the stats, which always cover the whole
/// pillar.
pub async fn pillar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<VoterQuery>,
) -> ApiResult<Json<PillarDashboard>> {
    require_role(&auth, Role::Pillar)?;

    let scope = Scope::for_requester(&state.db, &auth).await?;
    let filter = query.to_filter()?;

    let voters = Voter::list(&state.db, &scope, &filter, query.page(), ROSTER_PER_PAGE).await?;

    Ok(Json(PillarDashboard {
        stats: stats::scope_stats(&state.db, &scope).await?,
        voters,
        governorates: Voter::distinct_values(&state.db, &scope, GeoColumn::Governorate).await?,
        districts: Voter::distinct_values(&state.db, &scope, GeoColumn::District).await?,
        sub_districts: Voter::distinct_values(&state.db, &scope, GeoColumn::SubDistrict).await?,
    }))
}
