pub mod api;
pub mod auth;
pub mod cache;
pub mod discovery;
pub mod metrics;
pub mod model;
pub mod refresh;
pub mod settings;
pub mod state;

pub use api::Error;
