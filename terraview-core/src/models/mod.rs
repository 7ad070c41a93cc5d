// Module: models

pub mod id;
pub mod telemetry;

pub use id::{AccountId, TerrariumId};
pub use telemetry::{Reading, Terrarium};
