use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::warn;

use crate::MapWeatherError;
use crate::models::{Coordinate, Location, UnitSystem};
use crate::service::{OpenMeteoService, WeatherView};
use crate::session::Session;

/// Shared handler state: the service and the single session it drives.
///
/// The session mutex is held for the whole interaction so clicks, searches
/// and unit changes apply one at a time.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<OpenMeteoService>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(service: OpenMeteoService) -> Self {
        Self {
            service: Arc::new(service),
            session: Arc::new(Mutex::new(Session::default())),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ApiState {
    pub location: Location,
    pub units: UnitSystem,
}

impl From<&Session> for ApiState {
    fn from(session: &Session) -> Self {
        Self {
            location: Location::clone(&session.location()),
            units: session.units(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ClickRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Serialize, Deserialize)]
pub struct SearchResponse {
    pub matched: bool,
    pub location: Location,
}

#[derive(Serialize, Deserialize)]
pub struct UnitsRequest {
    pub units: UnitSystem,
}

/// Crate error rendered as `{"error": ...}` with a matching status
pub struct ApiError(MapWeatherError);

impl From<MapWeatherError> for ApiError {
    fn from(err: MapWeatherError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MapWeatherError::Validation { .. } => StatusCode::BAD_REQUEST,
            MapWeatherError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            MapWeatherError::Config { .. } | MapWeatherError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        warn!("Request failed with {}: {}", status, self.0);
        (status, Json(json!({ "error": self.0.user_message() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/click", post(post_click))
        .route("/search", post(post_search))
        .route("/units", put(put_units))
        .route("/weather", get(get_weather))
        .route("/cache/clear", post(clear_cache))
        .with_state(state)
}

async fn get_state(State(state): State<AppState>) -> Json<ApiState> {
    let session = state.session.lock().await;
    Json(ApiState::from(&*session))
}

async fn post_click(
    State(state): State<AppState>,
    Json(request): Json<ClickRequest>,
) -> Result<Json<Location>, ApiError> {
    let coordinate = Coordinate::new(request.latitude, request.longitude)?;
    let mut session = state.session.lock().await;
    let location = state.service.click(&mut session, coordinate).await;
    Ok(Json(Location::clone(&location)))
}

async fn post_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let mut session = state.session.lock().await;
    let matched = state
        .service
        .search(&mut session, &request.query, request.limit)
        .await;
    Json(SearchResponse {
        matched,
        location: Location::clone(&session.location()),
    })
}

async fn put_units(
    State(state): State<AppState>,
    Json(request): Json<UnitsRequest>,
) -> Json<ApiState> {
    let mut session = state.session.lock().await;
    state.service.set_units(&mut session, request.units);
    Json(ApiState::from(&*session))
}

async fn get_weather(State(state): State<AppState>) -> (StatusCode, Json<WeatherView>) {
    let session = state.session.lock().await;
    let view = state.service.view(&session).await;
    let status = if view.is_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    (status, Json(view))
}

async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.service.clear_cache();
    StatusCode::NO_CONTENT
}
