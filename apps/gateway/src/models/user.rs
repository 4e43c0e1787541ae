use serde::{Deserialize, Serialize};

/// Access role attached to a profile. Drives which admin screens the UI
/// offers; the gateway itself only stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Recruiter,
    Candidate,
}

/// Immutable once fetched; replaced wholesale on re-login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        let role: Role = serde_json::from_str(r#""recruiter""#).unwrap();
        assert_eq!(role, Role::Recruiter);
    }
}
