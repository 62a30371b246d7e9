/// Role-scoped visibility over the organizational tree
///
/// Every list and aggregate query in the service is restricted to a
/// [`Scope`], resolved once per request from the authenticated caller. The
/// scope names the subtree the caller may see; queries translate it into a
/// join plus one anchor condition.
///
/// Resolution is pure lookup with no side effects. A caller whose role has
/// no business with a resource kind is refused outright rather than served
/// an empty scope (see [`ResourceKind::visible_to`]).

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::auth::middleware::AuthContext;
use crate::models::{candidate::Candidate, entity::Entity, pillar::Pillar, user::Role};

/// The subtree of the hierarchy a requester may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Everything (admin)
    Global,

    /// Descendants of one entity
    Entity(Uuid),

    /// Descendants of one candidate
    Candidate(Uuid),

    /// One pillar's voters
    Pillar(Uuid),
}

/// Resource kinds a requester can ask to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Entities,
    Candidates,
    Pillars,
    Voters,
}

impl ResourceKind {
    /// Whether a role is allowed to list this kind at all
    ///
    /// A role asking outside its permitted kinds must be refused, never
    /// silently narrowed to an empty result.
    pub fn visible_to(&self, role: Role) -> bool {
        match self {
            ResourceKind::Entities => matches!(role, Role::Admin),
            ResourceKind::Candidates => matches!(role, Role::Admin | Role::Entity),
            ResourceKind::Pillars => {
                matches!(role, Role::Admin | Role::Entity | Role::Candidate)
            }
            ResourceKind::Voters => true,
        }
    }
}

impl Scope {
    /// Resolves the visibility scope of an authenticated requester
    ///
    /// Looks up the requester's profile row for its role. A non-admin user
    /// without a profile row is refused: the account exists but anchors no
    /// subtree.
    pub async fn for_requester(pool: &PgPool, auth: &AuthContext) -> Result<Self, AuthzError> {
        match auth.role {
            Role::Admin => Ok(Scope::Global),
            Role::Entity => {
                let entity = Entity::find_by_user(pool, auth.user_id)
                    .await?
                    .ok_or(AuthzError::MissingProfile(Role::Entity))?;
                Ok(Scope::Entity(entity.id))
            }
            Role::Candidate => {
                let candidate = Candidate::find_by_user(pool, auth.user_id)
                    .await?
                    .ok_or(AuthzError::MissingProfile(Role::Candidate))?;
                Ok(Scope::Candidate(candidate.id))
            }
            Role::Pillar => {
                let pillar = Pillar::find_by_user(pool, auth.user_id)
                    .await?
                    .ok_or(AuthzError::MissingProfile(Role::Pillar))?;
                Ok(Scope::Pillar(pillar.id))
            }
        }
    }

    /// The UUID anchoring this scope, if any
    ///
    /// Queries that use [`Scope::voter_joins`] / [`Scope::voter_condition`]
    /// must bind this value as `$1`.
    pub fn anchor(&self) -> Option<Uuid> {
        match self {
            Scope::Global => None,
            Scope::Entity(id) | Scope::Candidate(id) | Scope::Pillar(id) => Some(*id),
        }
    }

    /// Join clauses needed after `FROM voters v` to reach this scope's
    /// anchor
    pub fn voter_joins(&self) -> &'static str {
        match self {
            Scope::Global | Scope::Pillar(_) => "",
            Scope::Candidate(_) => " JOIN pillars p ON v.pillar_id = p.id",
            Scope::Entity(_) => {
                " JOIN pillars p ON v.pillar_id = p.id JOIN candidates c ON p.candidate_id = c.id"
            }
        }
    }

    /// The anchor condition over voters, with the anchor bound as `$1`
    pub fn voter_condition(&self) -> Option<&'static str> {
        match self {
            Scope::Global => None,
            Scope::Entity(_) => Some("c.entity_id = $1"),
            Scope::Candidate(_) => Some("p.candidate_id = $1"),
            Scope::Pillar(_) => Some("v.pillar_id = $1"),
        }
    }
}
