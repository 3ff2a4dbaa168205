#[path = "resilient_model/config.rs"]
mod config;

#[path = "resilient_model/wrapper.rs"]
mod wrapper;

pub use config::ResilienceConfig;
pub use wrapper::ResilientModel;
