use serde::{Deserialize, Serialize};

use crate::models::LoginResponse;

/// Authenticated identity kept across restarts
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub email: String,
}

impl Session {
    /// A session without a username or token is not a session.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.token.is_empty()
    }
}

impl From<LoginResponse> for Session {
    fn from(res: LoginResponse) -> Self {
        Self {
            username: res.username,
            token: res.token,
            email: res.email.unwrap_or_default(),
        }
    }
}
