use serde::{Deserialize, Serialize};

/// The signed-in account as reported by `GET /auth/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentUser {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl CurrentUser {
    /// Display name, falling back to the username as the web client does.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.username.as_deref())
    }
}
