use crate::handlers;
use crate::state::AppState;
use crate::storage::DataStore;
use axum::{
    Router,
    routing::{get, post},
};

pub fn router<S: DataStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(handlers::index::<S>))
        .route("/attendance", get(handlers::attendance_page::<S>))
        .route("/attendance/mark", post(handlers::mark_form::<S>))
        .route("/log", get(handlers::log_page::<S>))
        .route("/api/projection", get(handlers::get_projection::<S>))
        .route("/api/timetable", get(handlers::get_timetable::<S>))
        .route("/api/log", get(handlers::get_log::<S>))
        .route(
            "/api/attendance",
            get(handlers::get_attendance::<S>).post(handlers::mark_attendance::<S>),
        )
        .with_state(state)
}
