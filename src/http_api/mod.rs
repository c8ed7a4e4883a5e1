use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{HolidayProvider, MemoizedHolidays, PlanError, PlannerConfig, Schedule};

type SharedHolidays = Arc<MemoizedHolidays<Box<dyn HolidayProvider>>>;

/// The active configuration and the holiday cache built from it; swapped together.
#[derive(Clone)]
struct Current {
    config: PlannerConfig,
    holidays: SharedHolidays,
}

impl Current {
    fn new(config: PlannerConfig) -> Self {
        let holidays = Arc::new(MemoizedHolidays::new(config.holiday_provider()));
        Self { config, holidays }
    }
}

#[derive(Clone)]
pub struct AppState {
    current: Arc<RwLock<Current>>,
}

impl AppState {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Current::new(config))),
        }
    }

    fn snapshot(&self) -> Current {
        self.current.read().clone()
    }

    fn replace_config(&self, config: PlannerConfig) {
        let current = Current::new(config);
        *self.current.write() = current;
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PlanError> for ApiError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::InvalidAnchor { .. } => ApiError::Unprocessable(value.to_string()),
            other => ApiError::Invalid(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Unprocessable(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_anchor",
                    message,
                });
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            ApiError::Internal(message) => {
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    posting_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct BatchPayload {
    posting_dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchEntry {
    pub posting_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config).put(update_config))
        .route("/schedule", post(compute_schedule))
        .route("/schedules", post(compute_schedules))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, config: PlannerConfig) -> std::io::Result<()> {
    let state = AppState::new(config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<PlannerConfig> {
    Json(state.snapshot().config)
}

async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<PlannerConfig>,
) -> Result<Json<PlannerConfig>, ApiError> {
    config.planner().map_err(|err| ApiError::invalid(err.to_string()))?;
    state.replace_config(config.clone());
    Ok(Json(config))
}

async fn compute_schedule(
    State(state): State<AppState>,
    Json(payload): Json<SchedulePayload>,
) -> Result<Json<Schedule>, ApiError> {
    let Current { config, holidays } = state.snapshot();
    let planner = config.planner()?;
    let schedule = planner.plan(payload.posting_date, holidays.as_ref())?;
    Ok(Json(schedule))
}

async fn compute_schedules(
    State(state): State<AppState>,
    Json(payload): Json<BatchPayload>,
) -> Result<Json<Vec<BatchEntry>>, ApiError> {
    let Current { config, holidays } = state.snapshot();
    let planner = config.planner()?;
    let posting_dates = payload.posting_dates;
    // rayon fan-out stays off the async workers
    let results = tokio::task::spawn_blocking(move || {
        planner
            .plan_many(&posting_dates, holidays.as_ref())
            .into_iter()
            .zip(posting_dates.iter().copied())
            .map(|(result, posting_date)| match result {
                Ok(schedule) => BatchEntry {
                    posting_date,
                    schedule: Some(schedule),
                    error: None,
                },
                Err(err) => BatchEntry {
                    posting_date,
                    schedule: None,
                    error: Some(err.to_string()),
                },
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(Json(results))
}
