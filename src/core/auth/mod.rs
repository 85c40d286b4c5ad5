use serde::{Deserialize, Serialize};

/// Placeholder credentials passed to the game; no session is ever requested.
pub const OFFLINE_ACCESS_TOKEN: &str = "0";
pub const OFFLINE_USER_TYPE: &str = "legacy";

/// The player identity injected into the launch arguments.
///
/// The username is free text and is not validated beyond being non-blank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfflineIdentity {
    pub username: String,
    pub access_token: String,
    pub user_type: String,
}

impl OfflineIdentity {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            user_type: OFFLINE_USER_TYPE.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.username.is_empty()
    }
}
