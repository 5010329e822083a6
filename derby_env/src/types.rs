//! Common helpers for the Derby environment abstraction.

use uuid::Uuid;

/// Returns a process-unique identifier of the form `{prefix}-{token}`.
///
/// The token is the first 8 hex characters of a v4 UUID, which is plenty
/// for ids that only have to be unique within one running tournament.
pub fn unique_token(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}
