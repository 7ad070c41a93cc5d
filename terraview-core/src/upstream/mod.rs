// Module: upstream

pub mod client;
pub mod types;

pub use client::{ReadingSource, UpstreamClient};
pub use types::ViewerAccount;
