/// Primary keys are PostgreSQL BIGSERIAL throughout.
///
/// Employee and evaluator ids use the same type but are not foreign keys
/// here; they reference the company directory, which lives elsewhere.
pub type DbId = i64;

/// All timestamps are stored and compared in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
