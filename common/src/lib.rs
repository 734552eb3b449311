pub mod api;
pub mod config;
pub mod crypto;
pub mod transaction;
pub mod utils;
