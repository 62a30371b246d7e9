/// Database access layer
///
/// - `pool`: Connection pool creation and health checks
/// - `migrations`: Schema migration runner

pub mod migrations;
pub mod pool;
