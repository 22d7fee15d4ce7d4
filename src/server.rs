// Sales Dashboard - REST API with Axum
// Thin JSON adapter over the cross-filter engine. Each viewer gets a session.

use crate::controller::{InputEvent, Transition};
use crate::error::DashboardError;
use crate::selection::{ControlValues, DropdownOption, SelectionState, SliderConfig};
use crate::session::SessionRegistry;
use crate::views::{MapDataset, PieDataset};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

/// API Response wrapper
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

/// Year controls and page metadata
#[derive(Serialize, Deserialize)]
pub struct ControlsResponse {
    pub title: String,
    pub region_label: String,
    pub default_year: i32,
    pub dropdown: Vec<DropdownOption>,
    pub slider: SliderConfig,
}

/// Full view of one session
#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub state: SelectionState,
    pub controls: ControlValues,
    pub map: MapDataset,
    pub pie: PieDataset,
}

#[derive(Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub triggered: Vec<InputEvent>,
}

/// Transition plus only the views that changed
#[derive(Serialize, Deserialize)]
pub struct DispatchResponse {
    pub transition: Transition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapDataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pie: Option<PieDataset>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/controls - Dropdown options and slider marks
async fn get_controls(State(state): State<AppState>) -> impl IntoResponse {
    let dashboard = state.registry.dashboard();

    Json(ApiResponse::ok(ControlsResponse {
        title: dashboard.title().to_string(),
        region_label: dashboard.scope().region_label().to_string(),
        default_year: dashboard.default_year(),
        dropdown: dashboard.domain().dropdown_options(),
        slider: dashboard.domain().slider_config(),
    }))
}

/// GET /api/map/:year - Total sales per region
async fn get_map(State(state): State<AppState>, Path(year): Path<i32>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.registry.dashboard().derive_map_dataset(year)))
}

/// GET /api/pie/:region/:year - Product-line shares of one region
async fn get_pie(
    State(state): State<AppState>,
    Path((region, year)): Path<(String, i32)>,
) -> impl IntoResponse {
    // Path has already percent-decoded the segment exactly once
    Json(ApiResponse::ok(state.registry.dashboard().derive_pie_dataset(&region, year)))
}

/// POST /api/sessions - Start a viewer session
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, controller) = state.registry.create();
    let controller = controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let response = SessionResponse {
        id,
        state: controller.state().clone(),
        controls: controller.controls(),
        map: controller.current_map(),
        pie: controller.current_pie(),
    };

    (StatusCode::CREATED, Json(ApiResponse::ok(response)))
}

/// GET /api/sessions/:id - Current selection and views
async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(controller) = state.registry.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, format!("session {} not found", id));
    };
    let controller = controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let response = SessionResponse {
        id,
        state: controller.state().clone(),
        controls: controller.controls(),
        map: controller.current_map(),
        pie: controller.current_pie(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

/// POST /api/sessions/:id/dispatch - Apply one dispatch cycle
async fn dispatch_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DispatchRequest>,
) -> Response {
    let Some(controller) = state.registry.get(&id) else {
        return error_response(StatusCode::NOT_FOUND, format!("session {} not found", id));
    };
    let mut controller = controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    match controller.dispatch(&request.triggered) {
        Ok(transition) => {
            let map = transition.map_changed.then(|| controller.current_map());
            let pie = transition.pie_changed.then(|| controller.current_pie());

            let response = DispatchResponse { transition, map, pie };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e @ DashboardError::UnknownYear(_)) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => {
            tracing::error!("dispatch failed for session {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// DELETE /api/sessions/:id - End a viewer session
async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    if state.registry.remove(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("session {} not found", id))
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(registry: Arc<SessionRegistry>) -> Router {
    let state = AppState { registry };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/controls", get(get_controls))
        .route("/map/:year", get(get_map))
        .route("/pie/:region/:year", get(get_pie))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/dispatch", post(dispatch_events))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}
