//! Bot CRUD and export handlers for the REST API.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use replytree_core::tree::codec::{self, BotView};
use replytree_types::bot::{BotId, SaveBotRequest};
use replytree_types::error::BotError;
use replytree_types::tree::EditForm;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// An id that does not parse can never match a bot.
fn parse_id(raw: &str) -> Result<BotId, AppError> {
    raw.parse().map_err(|_| AppError::Bot(BotError::NotFound))
}

fn self_link(id: &BotId) -> String {
    format!("/api/v1/bots/{id}")
}

/// POST /api/v1/bots - Create a bot with its reply tree.
pub async fn create_bot(
    State(state): State<AppState>,
    Json(body): Json<SaveBotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BotView>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let tree = state.bot_service.create_bot(body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = self_link(&tree.bot.id);
    let resp = ApiResponse::success(codec::bot_view(&tree), request_id, elapsed)
        .with_link("self", &link)
        .with_link("map", &format!("{link}/map.html"));

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/bots - All bots with their trees, newest first.
pub async fn list_bots(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BotView>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let trees = state.bot_service.list_bots().await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let views = trees.iter().map(codec::bot_view).collect();
    let resp = ApiResponse::success(views, request_id, elapsed).with_link("self", "/api/v1/bots");

    Ok(Json(resp))
}

/// GET /api/v1/bots/:id - One bot with its tree.
pub async fn get_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BotView>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_id(&id)?;
    let tree = state.bot_service.get_bot(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let link = self_link(&id);
    let resp = ApiResponse::success(codec::bot_view(&tree), request_id, elapsed)
        .with_link("self", &link)
        .with_link("edit", &format!("{link}/edit"))
        .with_link("map", &format!("{link}/map.html"));

    Ok(Json(resp))
}

/// GET /api/v1/bots/:id/edit - Current values for pre-filling the edit form.
pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<EditForm>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_id(&id)?;
    let form = state.bot_service.edit_form(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(form, request_id, elapsed).with_link("self", &self_link(&id));

    Ok(Json(resp))
}

/// PUT /api/v1/bots/:id - Rename and rebuild the tree.
pub async fn update_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SaveBotRequest>,
) -> Result<Json<ApiResponse<BotView>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_id(&id)?;
    let tree = state.bot_service.update_bot(&id, body).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(codec::bot_view(&tree), request_id, elapsed)
        .with_link("self", &self_link(&id));

    Ok(Json(resp))
}

/// DELETE /api/v1/bots/:id - Delete a bot and every message under it.
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id = parse_id(&id)?;
    state.bot_service.delete_bot(&id).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(
        serde_json::json!({"deleted": true, "id": id.to_string()}),
        request_id,
        elapsed,
    );

    Ok(Json(resp))
}

/// GET /api/v1/bots/:id/map.html - HTML mind map, shown inline.
pub async fn export_map(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let map = state
        .bot_service
        .export_map(&id, state.renderer.as_ref(), &state.base_url())
        .await?;

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", map.filename))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(map.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        map.body,
    )
        .into_response())
}
