//! Route table, handlers, and the middleware stack.

use crate::error::{ApiError, ServerError};
use crate::response::Success;
use crate::state::AppState;
use crate::validation::{
    AddNodeRequest, AddNodesBatchRequest, BatchRelationshipsRequest, RelationshipPairRequest,
    ValidatedJson,
};
use axum::extract::{Path, Request, State};
use axum::http::{header, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use ensgraph_core::{BatchAddResult, FriendRelationship, GraphView, NodeRecord};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

/// Builds the CORS layer: the configured origin only, or any origin when unset.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer, ServerError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    match origin {
        Some(origin) => {
            let value = HeaderValue::from_str(origin)
                .map_err(|_| ServerError::InvalidCorsOrigin(origin.to_string()))?;
            Ok(layer.allow_origin(value))
        }
        None => Ok(layer.allow_origin(AnyOrigin)),
    }
}

/// Full application router.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    let friends = Router::new()
        .route("/graph", get(get_graph))
        .route("/relationships", get(list_relationships))
        .route("/add", post(add_relationship))
        .route("/batch", post(add_relationships_batch))
        .route("/delete", delete(delete_relationship))
        .route("/nodes", post(add_node))
        .route("/nodes/batch", post(add_nodes_batch))
        .route("/nodes/{ens_name}", delete(delete_node));

    let routes = Router::new()
        .route("/health", get(health))
        .nest("/api/friends", friends);
    with_middleware(routes, state, cors)
}

/// Adds the 404 fallback, request logging, panic recovery and CORS to `routes`.
pub fn with_middleware(routes: Router<AppState>, state: AppState, cors: CorsLayer) -> Router {
    routes
        .fallback(route_not_found)
        .layer(middleware::from_fn(log_request))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct NodesBatchCreated {
    created: usize,
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Backend is running",
        "environment": state.environment().as_str(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn get_graph(State(state): State<AppState>) -> Result<Success<GraphView>, ApiError> {
    let graph = state.with_service(|service| service.get_graph_data()).await?;
    Ok(Success::ok(graph))
}

async fn list_relationships(
    State(state): State<AppState>,
) -> Result<Success<Vec<FriendRelationship>>, ApiError> {
    let relationships = state
        .with_service(|service| service.list_relationships())
        .await?;
    Ok(Success::ok(relationships))
}

async fn add_relationship(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RelationshipPairRequest>,
) -> Result<Success<FriendRelationship>, ApiError> {
    let created = state
        .with_service(move |service| {
            service.add_relationship(&request.user_id, &request.friend_id)
        })
        .await?;
    Ok(Success::created(created).with_message("Friendship relationship created successfully"))
}

async fn add_relationships_batch(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<BatchRelationshipsRequest>,
) -> Result<Success<BatchAddResult>, ApiError> {
    let result = state
        .with_service(move |service| service.add_relationships_batch(&request.pairs))
        .await?;
    let message = format!(
        "Created {} relationships, skipped {}",
        result.created.len(),
        result.skipped
    );
    Ok(Success::created(result).with_message(message))
}

async fn delete_relationship(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RelationshipPairRequest>,
) -> Result<Success<()>, ApiError> {
    state
        .with_service(move |service| {
            service.delete_relationship(&request.user_id, &request.friend_id)
        })
        .await?;
    Ok(Success::ok(()).with_message("Friendship relationship deleted successfully"))
}

async fn add_node(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AddNodeRequest>,
) -> Result<Success<NodeRecord>, ApiError> {
    let node = state
        .with_service(move |service| service.add_node(&request.ens_name))
        .await?;
    Ok(Success::created(node).with_message("Node created successfully"))
}

async fn add_nodes_batch(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AddNodesBatchRequest>,
) -> Result<Success<NodesBatchCreated>, ApiError> {
    let created = state
        .with_service(move |service| service.add_nodes_batch(&request.ens_names))
        .await?;
    Ok(Success::created(NodesBatchCreated { created })
        .with_message(format!("Stored {created} nodes")))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(ens_name): Path<String>,
) -> Result<Success<()>, ApiError> {
    let target = ens_name.clone();
    let removed = state
        .with_service(move |service| service.delete_node(&target))
        .await?;
    if !removed {
        info!("event=node_delete module=server status=noop ens_name={ens_name}");
    }
    Ok(Success::ok(()).with_message("Node deleted successfully"))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route")
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "event=http_request module=server status={} method={} path={} duration_ms={}",
        response.status().as_u16(),
        method,
        path,
        started.elapsed().as_millis()
    );
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    error!("event=http_panic module=server status=error detail={detail}");
    ApiError::unexpected(detail, false).into_response()
}
