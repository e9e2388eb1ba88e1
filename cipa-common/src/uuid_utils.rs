//! UUID helpers for TEXT columns

use uuid::Uuid;

/// Parse a UUID stored as TEXT, mapping failures to [`crate::Error::Internal`]
pub fn parse_stored(column: &str, s: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| crate::Error::Internal(format!("Invalid UUID in column {}: {}", column, e)))
}
