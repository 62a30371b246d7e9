/// Statistics detail endpoint
///
/// Every counter on a dashboard links to a detail listing of the records
/// behind it. The listing is scoped exactly like the counter, so the numbers
/// and the rows always agree.
///
/// # Endpoint
///
/// ```text
/// GET /v1/statistics/:stat_type?search=&page=1
/// ```
///
/// `stat_type` is one of `voters`, `voted`, `not_voted`, `updated`,
/// `not_updated`, `candidates`, `pillars`, `entities`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::voters::VoterQuery,
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use canvass_shared::{
    auth::middleware::AuthContext,
    models::{
        candidate::{Candidate, CandidateListItem},
        entity::{Entity, EntityListItem},
        pillar::{Pillar, PillarListItem},
        voter::{CardStatus, Voter, VotingStatus},
    },
    pagination::Page,
    scope::{ResourceKind, Scope},
};
use serde::Serialize;

/// Page size for statistics detail listings
const DETAIL_PER_PAGE: i64 = 50;

/// The statistic a detail listing drills into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Voters,
    Voted,
    NotVoted,
    Updated,
    NotUpdated,
    Candidates,
    Pillars,
    Entities,
}

impl StatKind {
    /// Parses the URL segment; unknown kinds don't exist
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "voters" => Some(StatKind::Voters),
            "voted" => Some(StatKind::Voted),
            "not_voted" => Some(StatKind::NotVoted),
            "updated" => Some(StatKind::Updated),
            "not_updated" => Some(StatKind::NotUpdated),
            "candidates" => Some(StatKind::Candidates),
            "pillars" => Some(StatKind::Pillars),
            "entities" => Some(StatKind::Entities),
            _ => None,
        }
    }

    /// The resource kind this statistic lists, for the role gate
    pub fn resource(&self) -> ResourceKind {
        match self {
            StatKind::Voters
            | StatKind::Voted
            | StatKind::NotVoted
            | StatKind::Updated
            | StatKind::NotUpdated => ResourceKind::Voters,
            StatKind::Candidates => ResourceKind::Candidates,
            StatKind::Pillars => ResourceKind::Pillars,
            StatKind::Entities => ResourceKind::Entities,
        }
    }

    /// The status filter a voter statistic forces onto the listing
    fn forced_filter(&self) -> (Option<VotingStatus>, Option<CardStatus>) {
        match self {
            StatKind::Voted => (Some(VotingStatus::Voted), None),
            StatKind::NotVoted => (Some(VotingStatus::NotVoted), None),
            StatKind::Updated => (None, Some(CardStatus::Updated)),
            StatKind::NotUpdated => (None, Some(CardStatus::NotUpdated)),
            _ => (None, None),
        }
    }
}

/// Detail listing payload, shaped by the statistic
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatisticDetail {
    Voters(Page<Voter>),
    Candidates(Page<CandidateListItem>),
    Pillars(Vec<PillarListItem>),
    Entities(Page<EntityListItem>),
}

/// Statistics detail handler
///
/// # Errors
///
/// - `403 Forbidden`: The caller's role may not list this resource kind
/// - `404 Not Found`: Unknown statistic
pub async fn statistic_detail(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(stat_type): Path<String>,
    Query(query): Query<VoterQuery>,
) -> ApiResult<Json<StatisticDetail>> {
    let kind = StatKind::from_str(&stat_type)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown statistic: {}", stat_type)))?;

    if !kind.resource().visible_to(auth.role) {
        return Err(ApiError::Forbidden(
            "Insufficient permissions".to_string(),
        ));
    }

    let scope = Scope::for_requester(&state.db, &auth).await?;

    let detail = match kind {
        StatKind::Voters
        | StatKind::Voted
        | StatKind::NotVoted
        | StatKind::Updated
        | StatKind::NotUpdated => {
            let mut filter = query.to_filter()?;
            // A forced status overrides whatever the query carried, so
            // /statistics/voted never shows a non-voter.
            let (voting, card) = kind.forced_filter();
            if voting.is_some() {
                filter.voting_status = voting;
            }
            if card.is_some() {
                filter.card_status = card;
            }

            let page =
                Voter::list(&state.db, &scope, &filter, query.page(), DETAIL_PER_PAGE).await?;
            StatisticDetail::Voters(page)
        }
        StatKind::Candidates => {
            let entity_id = match scope {
                Scope::Global => None,
                Scope::Entity(id) => Some(id),
                // The role gate already refused narrower scopes
                _ => return Err(ApiError::Forbidden("Insufficient permissions".to_string())),
            };
            let page = Candidate::list(
                &state.db,
                entity_id,
                query.search.as_deref(),
                query.page(),
                DETAIL_PER_PAGE,
            )
            .await?;
            StatisticDetail::Candidates(page)
        }
        StatKind::Pillars => {
            StatisticDetail::Pillars(Pillar::list_in_scope(&state.db, &scope).await?)
        }
        StatKind::Entities => {
            let page = Entity::list(
                &state.db,
                query.search.as_deref(),
                query.page(),
                DETAIL_PER_PAGE,
            )
            .await?;
            StatisticDetail::Entities(page)
        }
    };

    Ok(Json(detail))
}
