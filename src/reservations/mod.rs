//! Reservations: booking, rescheduling, cancellation and slot availability

mod types;

use std::sync::Arc;

use chrono::SecondsFormat;
use tracing::{debug, info};
use vetdesk_auth::SessionManager;
use vetdesk_schedule::{ReservationDate, ReservationStatus, SlotGrid, TimeSlot};

use crate::error::Error;
use crate::fetch::Fetch;
use crate::validation::{require_contact, require_non_empty};

pub use types::*;

/// Client for `/reservation`
///
/// Dates and slots are checked against the clinic grid before anything is
/// sent, so an off-grid booking fails without a round trip.
#[derive(Clone)]
pub struct ReservationsClient {
    session: Arc<SessionManager>,
    grid: SlotGrid,
}

impl ReservationsClient {
    pub(crate) fn new(session: Arc<SessionManager>, grid: SlotGrid) -> Self {
        Self { session, grid }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub async fn list(&self) -> Result<Vec<ReservationRecord>, Error> {
        let records = Fetch::get(&self.session, "/reservation")
            .execute_optional::<Vec<ReservationRecord>>()
            .await?;
        Ok(records.unwrap_or_default())
    }

    pub async fn get(&self, id: i64) -> Result<ReservationRecord, Error> {
        Fetch::get(&self.session, &format!("/reservation/{}", id))
            .execute::<ReservationRecord>()
            .await
    }

    /// Book a reservation
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn run(vetdesk: vetdesk::VetDesk) -> Result<(), vetdesk::error::Error> {
    /// use vetdesk::reservations::{ClientRef, CreateReservationParams, PetRef, ReservationInfo};
    /// use vetdesk::schedule::{parse_time_slot, ReservationDate};
    ///
    /// let record = vetdesk
    ///     .reservations()
    ///     .create(&CreateReservationParams {
    ///         user_info: ClientRef::Existing { id: 12 },
    ///         pet_info: PetRef::Existing { id: 4 },
    ///         reservation_info: ReservationInfo {
    ///             date: ReservationDate::new(14, 4, 2025)?,
    ///             time: parse_time_slot("09:00-09:30")?,
    ///             service: "consultation".to_string(),
    ///         },
    ///     })
    ///     .await?;
    /// println!("booked {}", record.reservation.reservation_number);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create(&self, params: &CreateReservationParams) -> Result<ReservationRecord, Error> {
        self.validate(params)?;

        let record = Fetch::post(&self.session, "/reservation")
            .json(params)?
            .execute::<ReservationRecord>()
            .await?;
        info!(
            reservation_id = record.reservation.id,
            number = %record.reservation.reservation_number,
            "reservation created"
        );
        Ok(record)
    }

    /// Check a booking request without sending it.
    pub fn validate(&self, params: &CreateReservationParams) -> Result<(), Error> {
        if let ClientRef::New(client) = &params.user_info {
            require_non_empty("Name", &client.name)?;
            require_non_empty("Surname", &client.surname)?;
            require_contact(Some(client.email.as_str()), Some(client.phone_number.as_str()))?;
        }
        if let PetRef::New { name, specie } = &params.pet_info {
            require_non_empty("Pet name", name)?;
            require_non_empty("Pet specie", specie)?;
        }
        require_non_empty("Service", &params.reservation_info.service)?;
        self.grid.check(&params.reservation_info.time)?;
        Ok(())
    }

    pub async fn update(
        &self,
        id: i64,
        params: &UpdateReservationParams,
    ) -> Result<ReservationRecord, Error> {
        if let Some(time) = &params.time {
            self.grid.check(time)?;
        }
        Fetch::patch(&self.session, &format!("/reservation/{}", id))
            .json(params)?
            .execute::<ReservationRecord>()
            .await
    }

    /// Move a reservation to another date and slot.
    pub async fn reschedule(
        &self,
        id: i64,
        date: ReservationDate,
        time: TimeSlot,
    ) -> Result<ReservationRecord, Error> {
        self.update(
            id,
            &UpdateReservationParams {
                date: Some(date),
                time: Some(time),
                status: Some(ReservationStatus::Rescheduled),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn cancel(&self, id: i64) -> Result<ReservationRecord, Error> {
        let record = self
            .update(
                id,
                &UpdateReservationParams {
                    status: Some(ReservationStatus::Canceled),
                    ..Default::default()
                },
            )
            .await?;
        info!(reservation_id = id, "reservation canceled");
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        Fetch::delete(&self.session, &format!("/reservation/{}", id))
            .execute_optional::<serde_json::Value>()
            .await?;
        Ok(())
    }

    /// Slots still free on `date`
    pub async fn available_slots(&self, date: &ReservationDate) -> Result<Vec<TimeSlot>, Error> {
        let instant = date
            .to_instant()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        debug!(%date, "fetching available slots");

        let slots = Fetch::get(&self.session, "/reservation/slots")
            .query_param("date", &instant)
            .execute_optional::<Vec<TimeSlot>>()
            .await?;
        Ok(slots.unwrap_or_default())
    }

    /// Look a reservation up by the number handed to the client
    ///
    /// Needs no session.
    pub async fn check(&self, reservation_number: &str) -> Result<ReservationRecord, Error> {
        require_non_empty("Reservation number", reservation_number)?;
        let path = format!(
            "/reservation/check/{}",
            urlencoding::encode(reservation_number.trim())
        );
        Fetch::get(&self.session, &path)
            .public()
            .execute::<ReservationRecord>()
            .await
    }
}
