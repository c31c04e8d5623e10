pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod profiles;
pub mod search;
pub mod state;
pub mod storage;
pub mod store;
