//! Types for reservations

use serde::{Deserialize, Serialize};
use vetdesk_auth::UserProfile;
use vetdesk_schedule::{ReservationDate, ReservationStatus, TimeSlot};

use crate::pets::Pet;

/// A booked appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,

    /// Number handed to the client to look the reservation up
    pub reservation_number: String,

    pub pet_id: i64,

    pub user_id: i64,

    /// Staff member in charge, if assigned
    #[serde(default)]
    pub assignee_id: Option<i64>,

    #[serde(default)]
    pub created_at: String,

    pub date: ReservationDate,

    pub time: TimeSlot,

    pub status: ReservationStatus,
}

/// A reservation with the pet, client and assignee it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    pub reservation: Reservation,
    pub pet: Pet,
    pub user: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserProfile>,
}

/// One entry of a pet's reservation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationHistoryRow {
    pub date: ReservationDate,
    pub time: TimeSlot,
    pub status: ReservationStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    pub reservation_id: i64,
    pub reservation_number: String,
}

/// Client the reservation is made for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientRef {
    /// Already registered
    Existing { id: i64 },
    /// Registered together with the reservation
    New(NewClient),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone_number: String,
}

/// Pet the reservation is made for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PetRef {
    Existing { id: i64 },
    New { name: String, specie: String },
}

/// When and what for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationInfo {
    pub date: ReservationDate,
    pub time: TimeSlot,
    pub service: String,
}

/// Body of `POST /reservation`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationParams {
    pub user_info: ClientRef,
    pub pet_info: PetRef,
    pub reservation_info: ReservationInfo,
}

/// Body of `PATCH /reservation/:id`; unset fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReservationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<ReservationDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeSlot>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReservationStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_params_wire_format() {
        let params = CreateReservationParams {
            user_info: ClientRef::Existing { id: 12 },
            pet_info: PetRef::New {
                name: "Mimi".into(),
                specie: "cat".into(),
            },
            reservation_info: ReservationInfo {
                date: ReservationDate::new(5, 5, 2025).unwrap(),
                time: "10:00-10:30".parse().unwrap(),
                service: "vaccination".into(),
            },
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "userInfo": {"id": 12},
                "petInfo": {"name": "Mimi", "specie": "cat"},
                "reservationInfo": {
                    "date": {"day": 5, "month": 5, "year": 2025},
                    "time": {"from": "10:00", "to": "10:30"},
                    "service": "vaccination"
                }
            })
        );
    }

    #[test]
    fn test_reservation_with_legacy_status() {
        let reservation: Reservation = serde_json::from_value(json!({
            "id": 1,
            "reservationNumber": "R-0001",
            "petId": 4,
            "userId": 7,
            "assigneeId": null,
            "createdAt": "2025-05-01T09:00:00Z",
            "date": {"day": 6, "month": 5, "year": 2025},
            "time": {"from": "08:30", "to": "09:00"},
            "status": "reschedueld"
        }))
        .unwrap();
        assert_eq!(reservation.status, ReservationStatus::Rescheduled);
        assert_eq!(reservation.assignee_id, None);
    }
}
