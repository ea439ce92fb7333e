/**
 * Stats Routes
 * Dashboard counters
 */
use axum::{extract::State, Json};

use crate::auth::AdminSession;
use crate::db::models::Stats;
use crate::error::Result;
use crate::state::AppState;

/// GET /admin/stats - dashboard counters
pub async fn get_stats(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<Stats>> {
    Ok(Json(state.store.stats().await?))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_helpers::{get, send};
    use crate::state::test_support::{seed_admin, test_state};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_stats_counts() {
        let (state, _temp) = test_state().await;
        let (_, token) = seed_admin(&state).await;

        let res = send(crate::create_app(state), get("/admin/stats", Some(token.as_str()))).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body["totalUsers"], 1);
        assert_eq!(res.body["totalServices"], 0);
        assert_eq!(res.body["totalSliders"], 0);
        assert_eq!(res.body["totalWorks"], 0);
    }
}
