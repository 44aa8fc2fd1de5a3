use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/today", get(handlers::get_today))
        .route("/api/goals", get(handlers::list_goals).post(handlers::add_goal))
        .route("/api/goals/:id", delete(handlers::delete_goal))
        .route("/api/goals/:id/status", post(handlers::set_status))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/report/weekly", get(handlers::get_weekly_report))
        .route("/api/reminder", get(handlers::get_reminder))
        .route("/api/reminder/dismiss", post(handlers::dismiss_reminder))
        .route("/api/reflection", post(handlers::submit_reflection))
        .route("/api/reflection/open", post(handlers::open_reflection))
        .route("/api/reflection/close", post(handlers::close_reflection))
        .route("/api/chat", get(handlers::get_chat).post(handlers::send_chat))
        .with_state(state)
}
