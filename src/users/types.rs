//! Types for user accounts

use serde::Serialize;
use vetdesk_auth::{StaffRole, UserType};

/// Body of `PATCH /user/:id`; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Body of `POST /admin/users`
///
/// The new user receives a link to set a password. Staff accounts need a
/// role; every account needs an email or a phone number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountParams {
    pub name: String,

    pub surname: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    #[serde(rename = "type")]
    pub kind: UserType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
}

impl CreateAccountParams {
    pub fn client(name: &str, surname: &str) -> Self {
        Self {
            name: name.to_string(),
            surname: surname.to_string(),
            email: None,
            phone_number: None,
            kind: UserType::Client,
            role: None,
        }
    }

    pub fn staff(name: &str, surname: &str, role: StaffRole) -> Self {
        Self {
            kind: UserType::Staff,
            role: Some(role),
            ..Self::client(name, surname)
        }
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_phone_number(mut self, phone_number: &str) -> Self {
        self.phone_number = Some(phone_number.to_string());
        self
    }
}
