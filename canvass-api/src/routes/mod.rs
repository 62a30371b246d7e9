/// API route handlers
///
/// # Modules
///
/// - `health`: Health check
/// - `auth`: Login and token refresh
/// - `dashboards`: Role-specific dashboard payloads
/// - `voters`: Voter listing, registration and status updates
/// - `statistics`: Scoped statistics detail listings
/// - `entities`: Entity management (admin)
/// - `candidates`: Candidate management (admin/entity)
/// - `pillars`: Pillar management (candidate)
/// - `import`: Spreadsheet bulk import
/// - `appearance`: Theme configuration

pub mod appearance;
pub mod auth;
pub mod candidates;
pub mod dashboards;
pub mod entities;
pub mod health;
pub mod import;
pub mod pillars;
pub mod statistics;
pub mod voters;
