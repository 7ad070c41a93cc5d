//! Wire shapes for upstream API responses

use serde::Deserialize;

use crate::models::{AccountId, Terrarium};

/// Response body of `GET /users/{account_id}`.
///
/// Only the tracked-terrarium list matters to the relay; the remaining
/// account fields are ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewerAccount {
    pub id: AccountId,
    pub username: String,
    #[serde(rename = "terrariumData", default)]
    pub terrarium_data: Vec<Terrarium>,
}
