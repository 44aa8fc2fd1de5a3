use crate::errors::AppError;
use crate::models::{
    AiReflection, ChatRequest, ChatResponse, ChatTurn, Goal, NewGoalRequest, ReflectionCloseResponse,
    ReflectionOpenResponse, ReflectionRequest, ReminderResponse, StatusRequest, TodayResponse, UserStats,
    WeeklyReport,
};
use crate::state::{now, AppState};
use crate::stats::{build_today, build_weekly_report};
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let tracker = state.tracker.lock().await;
    let today = build_today(tracker.goals(), now().date());
    Html(render_index(&today, tracker.stats()))
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    let tracker = state.tracker.lock().await;
    Json(build_today(tracker.goals(), now().date()))
}

pub async fn list_goals(State(state): State<AppState>) -> Json<Vec<Goal>> {
    Json(state.tracker.lock().await.goals().to_vec())
}

pub async fn add_goal(
    State(state): State<AppState>,
    Json(payload): Json<NewGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    let goal = state.add_goal(payload, now()).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<Goal>, AppError> {
    Ok(Json(state.set_status(&id, payload.status, now()).await?))
}

pub async fn delete_goal(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, AppError> {
    state.delete_goal(&id, now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(State(state): State<AppState>) -> Json<UserStats> {
    Json(state.tracker.lock().await.stats().clone())
}

pub async fn get_weekly_report(State(state): State<AppState>) -> Json<WeeklyReport> {
    let tracker = state.tracker.lock().await;
    Json(build_weekly_report(tracker.goals(), now().date()))
}

pub async fn get_reminder(State(state): State<AppState>) -> Json<ReminderResponse> {
    Json(state.reminder(now()).await)
}

pub async fn dismiss_reminder(State(state): State<AppState>) -> StatusCode {
    state.dismiss_reminder().await;
    StatusCode::NO_CONTENT
}

pub async fn open_reflection(State(state): State<AppState>) -> Result<Json<ReflectionOpenResponse>, AppError> {
    let incomplete_goals = state.open_reflection(now()).await?;
    Ok(Json(ReflectionOpenResponse { incomplete_goals }))
}

pub async fn submit_reflection(
    State(state): State<AppState>,
    Json(payload): Json<ReflectionRequest>,
) -> Result<Json<AiReflection>, AppError> {
    Ok(Json(state.submit_reflection(&payload.reasons, now()).await?))
}

pub async fn close_reflection(State(state): State<AppState>) -> Result<Json<ReflectionCloseResponse>, AppError> {
    Ok(Json(state.close_reflection(now()).await?))
}

pub async fn get_chat(State(state): State<AppState>) -> Json<Vec<ChatTurn>> {
    Json(state.tracker.lock().await.chat_history().to_vec())
}

pub async fn send_chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    Ok(Json(state.send_chat(&payload.query).await?))
}
