use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use async_graphql_axum::{GraphQLProtocol, GraphQLWebSocket};
use axum::{
    extract::{Request, State, WebSocketUpgrade},
    http::{
        header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
        Method, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AuthUser, JwtService};
use crate::error::AppError;
use crate::gql::metrics::OperationSnapshot;
use crate::gql::MarketSchema;
use crate::middleware::jwt::{authenticate_header, jwt_middleware};
use crate::state::AppState;

/// Largest accepted GraphQL request body.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Build the Axum router: `/health`, `/metrics` and `/graphql` for both POST
/// queries and WebSocket subscriptions.
pub fn build_router(state: AppState, schema: MarketSchema) -> anyhow::Result<Router> {
    let config = state.config().clone();

    // Per-IP limit on the GraphQL endpoint; needs ConnectInfo<SocketAddr>
    let governor_conf = GovernorConfigBuilder::default()
        .per_millisecond(config.http_rate_limit.replenish_ms.max(1))
        .burst_size(config.http_rate_limit.burst.max(1))
        .finish()
        .context("invalid HTTP rate limit configuration")?;

    let graphql_routes = Router::new()
        .route(
            "/graphql",
            post({
                let schema = schema.clone();
                move |req| graphql_handler(req, schema)
            })
            .get({
                let schema = schema.clone();
                move |state, protocol, upgrade| graphql_ws_handler(state, protocol, upgrade, schema)
            }),
        )
        .layer(GovernorLayer::new(Arc::new(governor_conf)));

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    Ok(Router::new()
        // Liveness plus a data-source round-trip
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(graphql_routes)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, jwt_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE, AUTHORIZATION])
                .allow_credentials(true),
        ))
}

/// Execute a GraphQL request, forwarding the claims set by the JWT middleware.
async fn graphql_handler(req: Request, schema: MarketSchema) -> Result<Response, AppError> {
    let user = req.extensions().get::<AuthUser>().cloned();

    let (_parts, body) = req.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {}", e)))?;

    let mut gql_request: async_graphql::Request = serde_json::from_slice(&body_bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid GraphQL request: {}", e)))?;

    if let Some(user) = user {
        gql_request = gql_request.data(user);
    }

    let gql_response = schema.execute(gql_request).await;

    Ok(Json(gql_response).into_response())
}

/// WebSocket handler for GraphQL subscriptions.
/// The JWT travels in the `connection_init` payload instead of a header.
async fn graphql_ws_handler(
    State(state): State<AppState>,
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
    schema: MarketSchema,
) -> Response {
    let jwt_service = state.jwt_service().clone();

    upgrade
        .protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |stream| {
            GraphQLWebSocket::new(stream, schema, protocol)
                .on_connection_init(move |value: serde_json::Value| async move {
                    connection_init_data(&jwt_service, &value)
                })
                .serve()
        })
}

/// Turn a `connection_init` payload into per-connection context data.
///
/// Accepts `{ headers: { Authorization } }` or a top-level `Authorization`.
/// A missing token yields an anonymous connection; a bad one is refused.
pub fn connection_init_data(
    jwt_service: &JwtService,
    payload: &serde_json::Value,
) -> async_graphql::Result<async_graphql::Data> {
    let mut data = async_graphql::Data::default();

    let header = payload
        .get("headers")
        .and_then(|h| h.get("Authorization").or_else(|| h.get("authorization")))
        .or_else(|| payload.get("Authorization"))
        .or_else(|| payload.get("authorization"))
        .and_then(|v| v.as_str());

    let user = authenticate_header(jwt_service, header)
        .map_err(|_| async_graphql::Error::new("Invalid or expired token"))?;
    if let Some(user) = user {
        data.insert(user);
    }

    Ok(data)
}

async fn health(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.market_api().health().await?;
    Ok("ok")
}

/// Per-operation counters for GraphQL queries and mutations.
async fn metrics(State(state): State<AppState>) -> Json<Vec<OperationSnapshot>> {
    Json(state.metrics().snapshot())
}
