/// Database models for the canvass service
///
/// Ownership is strict containment down the tree: an entity owns candidates,
/// a candidate owns pillars, a pillar owns voters. Each of the three profile
/// kinds is backed 1:1 by a user row, and deleting the user cascades through
/// the profile and all of its descendants.
///
/// # Models
///
/// - `user`: Accounts with a role tag gating every operation
/// - `entity`: Top-level organizational sponsor
/// - `candidate`: Contestant belonging to one entity
/// - `pillar`: Canvassing sub-unit belonging to one candidate
/// - `voter`: Tracked individual with card/voting status
/// - `appearance`: Soft-singleton color theme configuration

pub mod appearance;
pub mod candidate;
pub mod entity;
pub mod pillar;
pub mod user;
pub mod voter;
