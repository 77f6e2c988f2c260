use serde::{Deserialize, Serialize};

/// Output of `auth.logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutOutput {
    pub success: bool,
}
