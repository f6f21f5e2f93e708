pub mod app;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod session;
pub mod state;
pub mod ui;
pub mod upstream;

pub use app::router;
pub use config::Config;
pub use state::AppState;
