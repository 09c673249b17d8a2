//! HTTP endpoint handlers. These are thin wrappers that forward to the engine.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::analytics::{MistakeCount, StudentMistakes, TopicMistakeCount};
use crate::assistant::{self, Goal};
use crate::domain::{Attempt, AttemptId, Class, ClassId, StepResult, TaskGraph, TaskId};
use crate::error::EngineError;
use crate::protocol::*;
use crate::state::AppState;

/// Engine error rendered as a JSON body with a matching status code.
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
  fn from(e: EngineError) -> Self { ApiError(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      EngineError::NotFound(_) => StatusCode::NOT_FOUND,
      EngineError::ChoiceNotFound { .. } => StatusCode::BAD_REQUEST,
      EngineError::StaleNode { .. } | EngineError::AlreadyCompleted(_) => StatusCode::CONFLICT,
      EngineError::InvalidState(_) => StatusCode::INTERNAL_SERVER_ERROR,
      EngineError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    match &self.0 {
      EngineError::InvalidState(_) => error!(target: "mathmind_backend", error = %self.0, "Data integrity failure"),
      EngineError::StorageUnavailable(_) => warn!(target: "mathmind_backend", error = %self.0, "Storage timed out"),
      _ => {}
    }
    (status, Json(ErrorOut { error: self.0.to_string(), kind: self.0.kind() })).into_response()
  }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_topics(State(state): State<Arc<AppState>>) -> ApiResult<TopicsOut> {
  let topics = state.engine.list_topics().await?;
  Ok(Json(TopicsOut { topics }))
}

#[instrument(level = "info", skip(state), fields(%task_id))]
pub async fn http_get_task(
  State(state): State<Arc<AppState>>,
  Path(task_id): Path<TaskId>,
) -> ApiResult<TaskGraph> {
  let graph = state.engine.load_graph(task_id).await?;
  Ok(Json(graph.as_ref().clone()))
}

#[instrument(level = "info", skip(state, body), fields(student = %body.student_id, class = %body.class_id, task = %body.task_id))]
pub async fn http_post_attempt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AttemptIn>,
) -> ApiResult<Attempt> {
  let attempt = state
    .engine
    .get_or_create_attempt(body.student_id, body.class_id, body.task_id)
    .await?;
  info!(target: "attempt", id = %attempt.id, node = %attempt.current_node, completed = attempt.completed, "Attempt served");
  Ok(Json(attempt))
}

#[instrument(level = "info", skip(state), fields(%attempt_id))]
pub async fn http_get_attempt(
  State(state): State<Arc<AppState>>,
  Path(attempt_id): Path<AttemptId>,
) -> ApiResult<Attempt> {
  Ok(Json(state.engine.get_attempt(attempt_id).await?))
}

#[instrument(level = "info", skip(state, body), fields(%attempt_id, node = %body.node_key, choice = %body.choice_key))]
pub async fn http_post_step(
  State(state): State<Arc<AppState>>,
  Path(attempt_id): Path<AttemptId>,
  Json(body): Json<StepIn>,
) -> ApiResult<StepResult> {
  let result = state
    .engine
    .submit_choice(attempt_id, &body.node_key, &body.choice_key)
    .await?;
  info!(target: "attempt", id = %attempt_id, correct = result.is_correct, completed = result.completed, "Step applied");
  Ok(Json(result))
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name))]
pub async fn http_post_class(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateClassIn>,
) -> Result<(StatusCode, Json<Class>), Response> {
  if body.name.trim().is_empty() {
    let out = ErrorOut { error: "class name is required".into(), kind: "bad_request" };
    return Err((StatusCode::BAD_REQUEST, Json(out)).into_response());
  }
  let class = state.engine.create_class(&body.name).await.map_err(|e| ApiError(e).into_response())?;
  info!(target: "mathmind_backend", id = %class.id, code = %class.invite_code, "Class created");
  Ok((StatusCode::CREATED, Json(class)))
}

#[instrument(level = "info", skip(state, body), fields(student = %body.student_id))]
pub async fn http_post_join_class(
  State(state): State<Arc<AppState>>,
  Json(body): Json<JoinClassIn>,
) -> ApiResult<Class> {
  let class = state
    .engine
    .join_class(&body.invite_code, body.student_id, body.student_name.as_deref())
    .await?;
  info!(target: "mathmind_backend", class = %class.id, student = %body.student_id, "Student joined class");
  Ok(Json(class))
}

#[instrument(level = "info", skip(state), fields(%class_id))]
pub async fn http_get_class(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
) -> ApiResult<Class> {
  Ok(Json(state.engine.get_class(class_id).await?))
}

#[instrument(level = "info", skip(state), fields(%class_id))]
pub async fn http_get_recent_mistakes(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
  Query(q): Query<RecentQuery>,
) -> ApiResult<RecentOut> {
  let limit = q.limit.unwrap_or(state.settings.recent_limit);
  let mistakes = state.engine.recent_for_class(class_id, limit).await?;
  Ok(Json(RecentOut { class_id, mistakes }))
}

#[instrument(level = "info", skip(state), fields(%class_id))]
pub async fn http_get_mistake_frequency(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
) -> ApiResult<Vec<MistakeCount>> {
  let rows = state.engine.mistake_frequency_by_class(class_id).await?;
  info!(target: "analytics", %class_id, kinds = rows.len(), "Mistake frequency computed");
  Ok(Json(rows))
}

#[instrument(level = "info", skip(state), fields(%class_id))]
pub async fn http_get_mistakes_by_topic(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
) -> ApiResult<Vec<TopicMistakeCount>> {
  Ok(Json(state.engine.mistake_frequency_by_topic(class_id).await?))
}

#[instrument(level = "info", skip(state), fields(%class_id))]
pub async fn http_get_student_breakdown(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
) -> ApiResult<Vec<StudentMistakes>> {
  let rows = state.engine.student_mistake_breakdown(class_id).await?;
  info!(target: "analytics", %class_id, students = rows.len(), "Student breakdown computed");
  Ok(Json(rows))
}

#[instrument(level = "info", skip(state, body), fields(%class_id, goal = %body.goal))]
pub async fn http_post_assistant(
  State(state): State<Arc<AppState>>,
  Path(class_id): Path<ClassId>,
  Json(body): Json<AssistantIn>,
) -> ApiResult<AssistantOut> {
  let mistakes = state.engine.mistake_frequency_by_class(class_id).await?;
  let goal = body.goal.parse::<Goal>().ok();
  let text = assistant::draft(goal, &body.topic, &mistakes);
  Ok(Json(AssistantOut { goal: body.goal, text }))
}
