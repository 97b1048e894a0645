//! HTTP control surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use brain::{Goal, GoalError, GoalGenerator, ItemRecord, LocationRecord};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::control::{ControlError, ControlHandle, RunCommand};
use crate::status::{RunState, Status};

#[derive(Clone)]
pub struct AppState {
    pub control: ControlHandle,
    pub generator: Arc<GoalGenerator>,
}

pub fn router(control: ControlHandle) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/command", post(command))
        .route("/goals", get(goals))
        .route("/goals/set", post(set_goal))
        .route("/goals/batch", post(set_goals))
        .route("/goals/custom", post(add_goal))
        .route("/goals/suggestions", get(suggestions))
        .route("/goals/{id}", delete(remove_goal))
        .route("/world/locations", get(locations))
        .route("/world/items", get(items))
        .with_state(AppState {
            control,
            generator: Arc::new(GoalGenerator::new()),
        })
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        let status = match &err {
            ControlError::UnknownCommand(_) => StatusCode::BAD_REQUEST,
            ControlError::Goal(GoalError::NotFound(_)) => StatusCode::NOT_FOUND,
            ControlError::Goal(GoalError::Duplicate(_) | GoalError::Permanent(_)) => {
                StatusCode::CONFLICT
            }
            ControlError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn status(State(state): State<AppState>) -> Json<Status> {
    Json(state.control.status())
}

#[derive(Deserialize)]
struct CommandBody {
    command: String,
}

#[derive(Serialize)]
struct CommandReply {
    command: RunCommand,
    state: RunState,
}

async fn command(
    State(state): State<AppState>,
    Json(body): Json<CommandBody>,
) -> Result<Json<CommandReply>, ApiError> {
    let command: RunCommand = body.command.parse()?;
    info!(?command, "control command");
    let run_state = state.control.command(command).await?;
    Ok(Json(CommandReply {
        command,
        state: run_state,
    }))
}

#[derive(Serialize)]
struct GoalList {
    goals: Vec<Goal>,
    active: Vec<String>,
}

async fn goals(State(state): State<AppState>) -> Json<GoalList> {
    let status = state.control.status();
    Json(GoalList {
        goals: status.goals,
        active: status.active_goals,
    })
}

#[derive(Deserialize)]
struct SetGoal {
    goal_id: String,
    enabled: bool,
}

async fn set_goal(
    State(state): State<AppState>,
    Json(body): Json<SetGoal>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.control.set_goal(&body.goal_id, body.enabled).await?;
    Ok(Json(json!({ "goal_id": body.goal_id, "enabled": body.enabled })))
}

#[derive(Deserialize)]
struct SetGoals {
    goals: BTreeMap<String, bool>,
}

async fn set_goals(
    State(state): State<AppState>,
    Json(body): Json<SetGoals>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let results = state.control.set_goals(body.goals).await?;
    Ok(Json(json!({ "results": results })))
}

#[derive(Deserialize)]
struct CustomGoal {
    goal_id: String,
    name: String,
    description: String,
    priority: Option<i32>,
}

async fn add_goal(
    State(state): State<AppState>,
    Json(body): Json<CustomGoal>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let id = body.goal_id.trim();
    if id.is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::bad_request("goal_id and name are required"));
    }
    let goal = state
        .generator
        .generate(id, body.name.trim(), body.description.trim(), body.priority);
    state.control.add_goal(goal.clone()).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn remove_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Goal>, ApiError> {
    Ok(Json(state.control.remove_goal(&id).await?))
}

#[derive(Deserialize)]
struct SuggestionQuery {
    #[serde(default)]
    q: String,
}

async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Json<serde_json::Value> {
    Json(json!({ "suggestions": state.generator.suggestions(&query.q) }))
}

#[derive(Serialize)]
struct Locations {
    locations: BTreeMap<String, LocationRecord>,
    count: usize,
}

/// Places visited so far, keyed by name.
async fn locations(State(state): State<AppState>) -> Json<Locations> {
    let locations: BTreeMap<String, LocationRecord> = state
        .control
        .status()
        .locations
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect();
    Json(Locations {
        count: locations.len(),
        locations,
    })
}

#[derive(Serialize)]
struct Items {
    items: BTreeMap<String, ItemRecord>,
    count: usize,
    god_rolls: usize,
}

async fn items(State(state): State<AppState>) -> Json<Items> {
    let items: BTreeMap<String, ItemRecord> = state
        .control
        .status()
        .items
        .into_iter()
        .map(|record| (record.name.clone(), record))
        .collect();
    Json(Items {
        count: items.len(),
        god_rolls: items.values().filter(|r| r.god_roll).count(),
        items,
    })
}
