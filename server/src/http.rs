use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{self, HeaderName, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get},
};
use chrono::{SecondsFormat, Utc};
use platform_api::{ApiError, ApiResult};
use products_hr::{Employee, EmployeeDraft, EmployeeId};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::AppConfig,
    directory::{Directory, EmployeeEntry},
    graphql::SchemaType,
};

#[derive(Clone)]
pub struct AppState {
    pub directory: Directory,
    pub schema: SchemaType,
    pub config: Arc<AppConfig>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "employee directory listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/heartbeat", get(heartbeat_handler))
        .route("/health", get(health_handler))
        .route("/employees", get(list_handler).post(create_handler))
        .route("/employees/{id}", delete(delete_handler))
        .route("/graphql", get(graphiql_handler).post(graphql_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HeartbeatResponse {
    status: &'static str,
    service: String,
    timestamp: String,
}

async fn heartbeat_handler(State(state): State<AppState>) -> Json<HeartbeatResponse> {
    Json(HeartbeatResponse {
        status: "ok",
        service: state.config.service_name.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    employees: usize,
    persistence: &'static str,
    version: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        employees: state.directory.store().len(),
        persistence: state.directory.persistence(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_handler(State(state): State<AppState>) -> Json<Vec<EmployeeEntry>> {
    Json(state.directory.list())
}

#[derive(Serialize)]
struct CreatedResponse {
    id: EmployeeId,
}

async fn create_handler(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let Json(draft) = payload.map_err(|err| ApiError::invalid_input(err.body_text()))?;
    let candidate = Employee::try_from(draft)?;
    let id = state.directory.add(candidate).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<EmployeeEntry>> {
    let id: EmployeeId = raw
        .parse()
        .map_err(|_| ApiError::invalid_input(format!("{raw:?} is not an employee id")))?;
    let employee = state.directory.remove(id).await?;
    Ok(Json(EmployeeEntry { id, employee }))
}

async fn graphql_handler(
    State(state): State<AppState>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(request.into_inner()).await.into()
}

async fn graphiql_handler() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}
