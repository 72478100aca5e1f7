// HTTP request handlers for API endpoints

use crate::api::error::ApiError;
use crate::api::models::*;
use crate::api::server::AppState;
use crate::api::validation::{validate_game, validate_search};
use crate::database_ops::games::GameFilter;
use actix_web::{web, HttpResponse};

type HandlerResult = Result<HttpResponse, ApiError>;

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> HandlerResult {
    let database = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            "disconnected"
        }
    };

    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

pub async fn list_games(state: web::Data<AppState>) -> HandlerResult {
    let games = state.store.find_all(&GameFilter::default()).await?;
    Ok(HttpResponse::Ok().json(games))
}

pub async fn create_game(
    state: web::Data<AppState>,
    payload: web::Json<GameRequest>,
) -> HandlerResult {
    let fields = validate_game(&payload)
        .map_err(ApiError::Validation)?
        .into_fields();
    let game = state.store.create(&fields).await?;
    tracing::info!(id = game.id, platform = %game.fields.platform, "game created");
    Ok(HttpResponse::Ok().json(game))
}

/// No criteria returns every game; a constrained search with no hits is 204.
pub async fn search_games(
    state: web::Data<AppState>,
    payload: web::Json<SearchRequest>,
) -> HandlerResult {
    let filter = validate_search(&payload).map_err(ApiError::Validation)?;
    let games = state.store.find_all(&filter).await?;
    if games.is_empty() && !filter.is_empty() {
        tracing::debug!(?filter, "search matched no games");
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok().json(games))
}

pub async fn update_game(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    payload: web::Json<GameRequest>,
) -> HandlerResult {
    let id = path.into_inner();
    let valid = validate_game(&payload).map_err(ApiError::Validation)?;
    let existing = state.store.find_by_pk(id).await?.ok_or(ApiError::NotFound)?;
    let fields = valid.merge_into(&existing.fields);
    let game = state
        .store
        .update(id, &fields)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(game))
}

pub async fn delete_game(state: web::Data<AppState>, path: web::Path<i64>) -> HandlerResult {
    let id = path.into_inner();
    if !state.store.destroy(id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!(id, "game deleted");
    Ok(HttpResponse::Ok().json(DeletedResponse { id }))
}

/// Fetch both top-games feeds and insert them in one transaction.
pub async fn populate_games(state: web::Data<AppState>) -> HandlerResult {
    tracing::info!("populate requested");
    let summary = state.populator.populate().await?;
    Ok(HttpResponse::Ok().json(summary))
}
