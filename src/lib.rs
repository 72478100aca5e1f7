pub mod api;
pub mod database_ops;
pub mod error;
pub mod logging;
pub mod normalization;
pub mod orchestrator;

pub mod util {
    pub mod env;
}
