//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::responses::{
    ApiResponse, HealthResponse, NoticesResponse, StartTimerRequest, StatusResponse, TimersResponse,
};
use crate::{error::TimerError, state::AppState};

type ApiResult = (StatusCode, Json<ApiResponse>);

fn timer_error(e: TimerError) -> ApiResult {
    let status = match e {
        TimerError::EmptyName | TimerError::ZeroDuration | TimerError::DurationTooLong(_) => {
            StatusCode::BAD_REQUEST
        }
        TimerError::DuplicateTimerName(_) => StatusCode::CONFLICT,
        TimerError::UnknownTimerName(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(ApiResponse::error(e.to_string())))
}

/// Handle POST /timers - Start a named countdown
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartTimerRequest>,
) -> ApiResult {
    let seconds = request.total_seconds();
    if seconds == 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Set the timer duration".to_string())),
        );
    }

    match state.timers.start(&request.name, seconds) {
        Ok(view) => {
            state.record_action(format!("start {}", view.name));
            (
                StatusCode::CREATED,
                Json(ApiResponse::ok(format!("Timer \"{}\" started", view.name), Some(view))),
            )
        }
        Err(e) => {
            warn!("Start of timer {:?} refused: {}", request.name, e);
            timer_error(e)
        }
    }
}

/// Handle POST /timers/:name/toggle - Pause or resume a timer
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult {
    match state.timers.toggle_pause(&name) {
        Ok(view) => {
            let verb = if view.paused { "paused" } else { "resumed" };
            state.record_action(format!("toggle {}", name));
            (
                StatusCode::OK,
                Json(ApiResponse::ok(format!("Timer \"{}\" {}", name, verb), Some(view))),
            )
        }
        Err(e) => timer_error(e),
    }
}

/// Handle DELETE /timers/:name - Cancel a timer
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult {
    match state.timers.stop(&name) {
        Ok(()) => {
            state.record_action(format!("stop {}", name));
            (
                StatusCode::OK,
                Json(ApiResponse::ok(format!("Timer \"{}\" stopped", name), None)),
            )
        }
        Err(e) => timer_error(e),
    }
}

/// Handle GET /timers - Countdown surface contents
pub async fn list_timers_handler(State(state): State<Arc<AppState>>) -> Json<TimersResponse> {
    Json(TimersResponse {
        visible: state.timers.is_surface_visible(),
        timers: state.timers.snapshot(),
    })
}

/// Handle GET /timers/events - Stream timer events as server-sent events
pub async fn timer_events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("Timer event stream opened");
    let events = stream::unfold(state.timers.subscribe(), |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((Event::default().json_data(&event), rx)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// Handle GET /notices - Recent user notices
pub async fn notices_handler(State(state): State<Arc<AppState>>) -> Json<NoticesResponse> {
    Json(NoticesResponse {
        notices: state.notices.recent(),
    })
}

/// Handle GET /status - Return current server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        active_timers: state.timers.len(),
        surface_visible: state.timers.is_surface_visible(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
