//! Pet records and their reservation history

mod types;

use std::sync::Arc;

use tracing::info;
use vetdesk_auth::SessionManager;

use crate::error::Error;
use crate::fetch::Fetch;
use crate::reservations::ReservationHistoryRow;
use crate::validation::require_non_empty;

pub use types::*;

/// Client for `/pet`
#[derive(Clone)]
pub struct PetsClient {
    session: Arc<SessionManager>,
}

impl PetsClient {
    pub(crate) fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    /// All pets visible to the logged-in user
    pub async fn list(&self) -> Result<Vec<PetRecord>, Error> {
        let pets = Fetch::get(&self.session, "/pet")
            .execute_optional::<Vec<PetRecord>>()
            .await?;
        Ok(pets.unwrap_or_default())
    }

    /// A pet with its owner
    pub async fn get(&self, id: i64) -> Result<PetInfo, Error> {
        Fetch::get(&self.session, &format!("/pet/{}", id))
            .execute::<PetInfo>()
            .await
    }

    /// Register a pet
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run(vetdesk: vetdesk::VetDesk) -> Result<(), vetdesk::error::Error> {
    /// use vetdesk::pets::CreatePetParams;
    ///
    /// let pet = vetdesk
    ///     .pets()
    ///     .create(&CreatePetParams {
    ///         name: "Rex".to_string(),
    ///         specie: "dog".to_string(),
    ///         ..Default::default()
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(&self, params: &CreatePetParams) -> Result<Pet, Error> {
        require_non_empty("Pet name", &params.name)?;
        require_non_empty("Pet specie", &params.specie)?;

        let pet = Fetch::post(&self.session, "/pet")
            .json(params)?
            .execute::<Pet>()
            .await?;
        info!(pet_id = pet.id, "pet created");
        Ok(pet)
    }

    pub async fn update(&self, id: i64, params: &UpdatePetParams) -> Result<PetInfo, Error> {
        if let Some(name) = &params.name {
            require_non_empty("Pet name", name)?;
        }
        Fetch::patch(&self.session, &format!("/pet/{}", id))
            .json(params)?
            .execute::<PetInfo>()
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        Fetch::delete(&self.session, &format!("/pet/{}", id))
            .execute_optional::<serde_json::Value>()
            .await?;
        info!(pet_id = id, "pet deleted");
        Ok(())
    }

    /// Past and upcoming reservations of a pet
    pub async fn history(&self, id: i64) -> Result<Vec<ReservationHistoryRow>, Error> {
        let rows = Fetch::get(&self.session, &format!("/pet/{}/history", id))
            .execute_optional::<Vec<ReservationHistoryRow>>()
            .await?;
        Ok(rows.unwrap_or_default())
    }
}
