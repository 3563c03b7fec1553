//! User accounts and the admin account-creation endpoint

mod types;

use std::sync::Arc;

use tracing::info;
use vetdesk_auth::{SessionManager, UserProfile, UserType};

use crate::error::Error;
use crate::fetch::Fetch;
use crate::validation::{check_email, require_contact, require_non_empty};

pub use types::*;

/// Client for `/user` and `/admin/users`
#[derive(Clone)]
pub struct UsersClient {
    session: Arc<SessionManager>,
}

impl UsersClient {
    pub(crate) fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// Profile of the logged-in user, refreshed from the server
    pub async fn me(&self) -> Result<UserProfile, Error> {
        Ok(self.session.fetch_current_user().await?)
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, Error> {
        let users = Fetch::get(&self.session, "/user")
            .execute_optional::<Vec<UserProfile>>()
            .await?;
        Ok(users.unwrap_or_default())
    }

    pub async fn update(&self, id: i64, params: &UpdateUserParams) -> Result<UserProfile, Error> {
        if let Some(email) = params.email.as_deref().filter(|email| !email.is_empty()) {
            check_email(email)?;
        }
        Fetch::patch(&self.session, &format!("/user/{}", id))
            .json(params)?
            .execute::<UserProfile>()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        Fetch::delete(&self.session, &format!("/user/{}", id))
            .execute_optional::<serde_json::Value>()
            .await?;
        Ok(())
    }

    /// Create a client or staff account as an administrator
    pub async fn create_account(&self, params: &CreateAccountParams) -> Result<UserProfile, Error> {
        validate_account(params)?;

        let user = Fetch::post(&self.session, "/admin/users")
            .json(params)?
            .execute::<UserProfile>()
            .await?;
        info!(user_id = user.id, kind = ?params.kind, "account created");
        Ok(user)
    }
}

fn validate_account(params: &CreateAccountParams) -> Result<(), Error> {
    require_non_empty("Name", &params.name)?;
    require_non_empty("Surname", &params.surname)?;
    require_contact(params.email.as_deref(), params.phone_number.as_deref())?;
    match params.kind {
        UserType::Staff if params.role.is_none() => {
            Err(Error::validation("Missing role for staff member"))
        }
        UserType::Anonymous => Err(Error::validation(
            "Accounts are created for staff or clients",
        )),
        _ => Ok(()),
    }
}
