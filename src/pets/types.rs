//! Types for pet records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A pet as stored by the clinic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,

    pub name: String,

    /// User id of the owner
    pub owner_id: i64,

    pub specie: String,

    /// ISO timestamp
    #[serde(default)]
    pub created_at: String,

    /// Free-form details (breed, weight, notes, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Owner details shown alongside a pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub name: String,

    #[serde(default)]
    pub surname: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone_number: String,

    #[serde(default)]
    pub created_at: String,
}

/// A pet together with its owner, as returned by `GET /pet/:id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetInfo {
    pub pet: Pet,
    pub owner: OwnerSummary,
}

/// Row of the pet listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetRecord {
    pub id: i64,
    pub name: String,
    pub owner: OwnerSummary,
    pub owner_id: i64,
    pub specie: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Body of `POST /pet`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetParams {
    pub name: String,

    /// Defaults to the logged-in user on the server side
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,

    pub specie: String,

    pub metadata: Map<String, Value>,
}

/// Body of `PATCH /pet/:id`; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}
