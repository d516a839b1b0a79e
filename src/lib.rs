pub mod config;
pub mod error;
pub mod fetch;
pub mod model;
pub mod providers;
pub mod server;
pub mod storage;
