//! Types for credentials and user profiles

use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Kind of account behind a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Anonymous,
    Staff,
    Client,
}

/// Role of a staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Veterinary,
    Receptionist,
    Admin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Veterinary => "veterinary",
            Self::Receptionist => "receptionist",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of the logged-in user
///
/// Staff profiles additionally carry `role` and `staffId`. The login endpoint
/// may answer with the short `{id, name, email}` form, so everything else
/// falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(rename = "type", default)]
    pub kind: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<i64>,
}

impl UserProfile {
    pub fn is_staff(&self) -> bool {
        self.kind == UserType::Staff
    }

    pub fn has_role(&self, role: StaffRole) -> bool {
        self.role == Some(role)
    }
}

/// The persisted credential record
///
/// Always replaced as a whole; `expires_at` is stored as epoch milliseconds.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.user.is_none()
            && self.expires_at.is_none()
    }

    /// Expired when no expiry is recorded or `now` is past it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at,
            None => true,
        }
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Where the session stands in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Fresh,
    Expired,
}

/// `Authorization: Bearer <token>` header
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader {
    value: String,
}

impl AuthHeader {
    pub(crate) fn bearer(token: &str) -> Self {
        Self {
            value: format!("Bearer {}", token),
        }
    }

    pub fn name(&self) -> &'static str {
        "Authorization"
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Header value marked sensitive so it is masked in `reqwest` debug output.
    pub fn to_header_value(&self) -> Result<HeaderValue, AuthError> {
        let mut value = HeaderValue::from_str(&self.value)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthHeader(Bearer <redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_short_profile_form() {
        let user: UserProfile =
            serde_json::from_value(json!({"id": 7, "name": "Ana", "email": "ana@clinic.test"}))
                .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.kind, UserType::Anonymous);
        assert!(user.surname.is_empty());
        assert!(user.role.is_none());
    }

    #[test]
    fn test_staff_profile() {
        let user: UserProfile = serde_json::from_value(json!({
            "id": 3,
            "name": "Jo",
            "surname": "Rakoto",
            "email": "jo@clinic.test",
            "phoneNumber": "0341234567",
            "createdAt": "2024-05-01T08:00:00Z",
            "type": "staff",
            "role": "veterinary",
            "staffId": 12
        }))
        .unwrap();
        assert!(user.is_staff());
        assert!(user.has_role(StaffRole::Veterinary));
        assert_eq!(user.staff_id, Some(12));
    }

    #[test]
    fn test_credentials_wire_format() {
        let expires_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 15, 0).unwrap();
        let credentials = Credentials {
            access_token: Some("access".into()),
            refresh_token: Some("refresh".into()),
            user: None,
            expires_at: Some(expires_at),
        };
        let value = serde_json::to_value(&credentials).unwrap();
        assert_eq!(value["accessToken"], "access");
        assert_eq!(value["expiresAt"], expires_at.timestamp_millis());
        assert!(value.get("user").is_none());

        let empty: Credentials = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_expiry_rules() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert!(Credentials::default().is_expired_at(now));

        let credentials = Credentials {
            expires_at: Some(now),
            ..Default::default()
        };
        assert!(!credentials.is_expired_at(now));
        assert!(credentials.is_expired_at(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let credentials = Credentials {
            access_token: Some("secret-access".into()),
            refresh_token: Some("secret-refresh".into()),
            ..Default::default()
        };
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("secret"));

        let header = AuthHeader::bearer("secret-access");
        assert_eq!(header.value(), "Bearer secret-access");
        assert!(!format!("{:?}", header).contains("secret"));
        assert_eq!(header.name(), "Authorization");
    }
}
