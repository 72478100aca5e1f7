// HTTP API for the top-games service: game CRUD, search and feed population.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod validation;

pub use server::{ApiServer, AppState};
