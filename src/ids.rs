//! Identifier minting and timestamp helpers shared by the translators.

use uuid::Uuid;

/// Collision-resistant token used as the tail of minted identifiers.
/// Rendered without hyphens to match the `resp_`/`msg_`/`fc_` id shapes
/// clients expect on the wire.
pub(crate) fn uuid_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Mint a prefixed identifier, e.g. `mint("resp")` -> `resp_0a1b…`.
pub(crate) fn mint(prefix: &str) -> String {
    format!("{prefix}_{}", uuid_token())
}

/// Integer seconds since the Unix epoch.
pub(crate) fn unix_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
