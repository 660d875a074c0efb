//! Command ingress from the gateway bridge.

use axum::Json;
use axum::extract::State;

use keydrop_core::events::{CommandEvent, CommandReply};

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/events
pub async fn dispatch_event(
    State(state): State<AppState>,
    Json(event): Json<CommandEvent>,
) -> ApiResult<Json<ApiResponse<CommandReply>>> {
    let reply = state.dispatcher.dispatch(&event).await?;
    Ok(Json(ApiResponse::ok(reply)))
}
