//! Read-only inventory and leaderboard snapshots.

use axum::Json;
use axum::extract::State;

use keydrop_service::inventory::InventorySnapshot;
use keydrop_service::leaderboard::LeaderboardSnapshot;

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/inventory
pub async fn inventory(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<InventorySnapshot>>> {
    let snapshot = state.views.inventory().snapshot().await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /api/leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<LeaderboardSnapshot>>> {
    let snapshot = state.views.leaderboard().snapshot().await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}
