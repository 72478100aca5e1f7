// API route configuration

use crate::api::error::ApiError;
use crate::api::handlers;
use actix_web::{error, web, HttpRequest};

fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::invalid("body", err.to_string()).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::invalid("id", err.to_string()).into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/games")
                .route("", web::get().to(handlers::list_games))
                .route("", web::post().to(handlers::create_game))
                .route("/search", web::post().to(handlers::search_games))
                .route("/populate", web::post().to(handlers::populate_games))
                .route("/{id}", web::put().to(handlers::update_game))
                .route("/{id}", web::delete().to(handlers::delete_game)),
        );
}
