/// Database layer for Atelier
///
/// - `pool`: PostgreSQL connection pool with a startup health check
/// - `migrations`: Runs the SQL files in the workspace `migrations/` directory
///
/// Table models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
