//! User profile types
//!
//! Cached copy of the signed-in Google account, overwritten on every
//! successful fetch and cleared on sign-out.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl UserProfile {
    /// `"Name" <address>` when a display name is known, the bare address
    /// otherwise.
    pub fn mailbox(&self) -> String {
        let name = self.name.replace(['"', '\r', '\n'], "");
        if name.trim().is_empty() {
            format!("<{}>", self.email)
        } else {
            format!("\"{}\" <{}>", name.trim(), self.email)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_formats() {
        let profile = UserProfile {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            picture: None,
        };
        assert_eq!(profile.mailbox(), "\"Ada Lovelace\" <ada@example.com>");

        let anonymous = UserProfile { name: String::new(), ..profile };
        assert_eq!(anonymous.mailbox(), "<ada@example.com>");
    }

    #[test]
    fn parses_google_userinfo_with_extra_fields() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"id":"1","email":"a@b.c","verified_email":true,"name":"A","picture":"https://p"}"#,
        )
        .unwrap();
        assert_eq!(profile.name, "A");
        assert_eq!(profile.picture.as_deref(), Some("https://p"));
    }
}
