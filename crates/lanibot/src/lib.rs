pub mod config;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod transport;
pub mod verification;
