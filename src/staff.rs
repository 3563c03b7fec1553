//! Clinic staff members

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vetdesk_auth::{SessionManager, StaffRole};

use crate::error::Error;
use crate::fetch::Fetch;

/// A staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: i64,
    pub user_id: i64,
    pub role: StaffRole,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<StaffUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffUser {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /staff`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub user_id: i64,
    pub role: StaffRole,
}

/// Body of `PATCH /staff/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateStaffParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<StaffRole>,
}

/// Client for `/staff`
#[derive(Clone)]
pub struct StaffClient {
    session: Arc<SessionManager>,
}

impl StaffClient {
    pub(crate) fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// All staff members, or only those with `role`
    pub async fn list(&self, role: Option<StaffRole>) -> Result<Vec<Staff>, Error> {
        let mut request = Fetch::get(&self.session, "/staff");
        if let Some(role) = role {
            request = request.query_param("role", role.as_str());
        }
        Ok(request
            .execute_optional::<Vec<Staff>>()
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: i64) -> Result<Staff, Error> {
        Fetch::get(&self.session, &format!("/staff/{}", id))
            .execute::<Staff>()
            .await
    }

    pub async fn create(&self, staff: &NewStaff) -> Result<Staff, Error> {
        Fetch::post(&self.session, "/staff")
            .json(staff)?
            .execute::<Staff>()
            .await
    }

    pub async fn update(&self, id: i64, params: &UpdateStaffParams) -> Result<Staff, Error> {
        Fetch::patch(&self.session, &format!("/staff/{}", id))
            .json(params)?
            .execute::<Staff>()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        Fetch::delete(&self.session, &format!("/staff/{}", id))
            .execute_optional::<serde_json::Value>()
            .await?;
        Ok(())
    }
}
