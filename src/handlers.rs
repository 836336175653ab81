use crate::errors::{AppError, StoreErrorKind};
use crate::models::{
    AttendanceRecord, AttendanceResponse, LogEntry, MarkAttendanceRequest, MarkAttendanceResponse,
    NewAttendance, TimetableResponse, UserQuery,
};
use crate::projector::Projection;
use crate::state::AppState;
use crate::storage::DataStore;
use crate::ui::{render_attendance, render_log, render_timetable, user_path};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::{Local, NaiveDate};
use tracing::{error, warn};

pub async fn index<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Html<String>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Html(render_timetable(&projection, &user_id, today())))
}

pub async fn attendance_page<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Html<String>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Html(render_attendance(&projection, &user_id)))
}

pub async fn mark_form<S: DataStore>(
    State(state): State<AppState<S>>,
    Form(payload): Form<MarkAttendanceRequest>,
) -> Result<Redirect, AppError> {
    let (record, _) = apply_mark(&state, payload).await?;
    Ok(Redirect::to(&user_path("/", &record.user_id)))
}

pub async fn log_page<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Html<String>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Html(render_log(&projection, &user_id)))
}

pub async fn get_projection<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Projection>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    Ok(Json(state.refresh(&user_id).await?))
}

pub async fn get_timetable<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<TimetableResponse>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Json(TimetableResponse {
        time_slots: projection.time_slots,
        days: projection.days,
        grid: projection.grid,
    }))
}

pub async fn get_attendance<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<AttendanceResponse>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Json(AttendanceResponse {
        attendance_by_course: projection.attendance_by_course,
        stats: projection.stats,
    }))
}

pub async fn get_log<S: DataStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let user_id = state.user_or_default(query.user_id.as_deref());
    let projection = state.refresh(&user_id).await?;
    Ok(Json(projection.log_entries()))
}

pub async fn mark_attendance<S: DataStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<MarkAttendanceRequest>,
) -> Result<(StatusCode, Json<MarkAttendanceResponse>), AppError> {
    let (record, projection) = apply_mark(&state, payload).await?;
    let view = projection.course(&record.course_code);
    let response = MarkAttendanceResponse {
        message: format!("Attendance marked as {} for {}", record.status, view.name()),
        stat: projection.stats.get_or_default(&record.course_code),
        record,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Inserts the record, then re-fetches and re-projects so callers see the
/// store's view rather than a locally patched one.
async fn apply_mark<S: DataStore>(
    state: &AppState<S>,
    request: MarkAttendanceRequest,
) -> Result<(AttendanceRecord, Projection), AppError> {
    let course_code = request.course_code.trim().to_string();
    if course_code.is_empty() {
        return Err(AppError::bad_request("course_code is required"));
    }

    let user_id = state.user_or_default(request.user_id.as_deref());
    let new = NewAttendance {
        course_code,
        date: request.date.unwrap_or_else(today),
        status: request.status,
        user_id: user_id.clone(),
    };

    let record = match state.store.insert_attendance(new).await {
        Ok(record) => record,
        Err(err) => {
            match err.kind() {
                StoreErrorKind::Duplicate => warn!("rejected attendance: {err}"),
                StoreErrorKind::Other => error!("failed to mark attendance: {err}"),
            }
            return Err(err.into());
        }
    };

    let projection = state.refresh(&user_id).await?;
    Ok((record, projection))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
