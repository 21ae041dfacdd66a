pub mod cache;
pub mod db;
pub mod fiscal;
pub mod normalize;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod treasury;
pub mod writer;
