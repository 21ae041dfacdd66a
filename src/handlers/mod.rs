pub mod error;
pub mod fiscal;
pub mod updates;

use std::sync::Arc;

use crate::services::store::AuctionStore;

pub type SharedStore = Arc<dyn AuctionStore>;
