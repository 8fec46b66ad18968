pub mod clients;
pub mod config;
pub mod context;
pub mod models;
pub mod routes;
pub mod storage;
pub mod ui;
pub mod views;
pub mod ws;

pub use config::Config;
pub use context::AppContext;
