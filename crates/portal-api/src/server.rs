use std::fmt;
use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::Method;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use contracts::{
    ApiError, CaseEvent, CaseFile, CaseStatus, CaseTab, ChargeSubmission, ContactKey,
    ContactSnapshot, Decision, ErrorCode, ProgressionRecord, SignalState, TranscriptLine,
    SCHEMA_VERSION_V1,
};
use portal_core::contacts::ContactUnavailable;
use portal_core::session::SessionError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Mutex};

use crate::{GatewayError, PortalApi, PortalError};

include!("server/error.rs");
include!("server/state.rs");
include!("server/routes/control.rs");
include!("server/routes/query.rs");
include!("server/routes/stream.rs");
include!("server/util.rs");

pub async fn serve(addr: SocketAddr, portal: PortalApi) -> Result<(), ServerError> {
    let state = AppState::new(portal);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/case", get(get_case_file))
        .route("/api/v1/case/{tab}", get(get_case_tab))
        .route("/api/v1/session", get(get_session))
        .route("/api/v1/session/status", get(get_status))
        .route(
            "/api/v1/session/contacts/{key}/select",
            post(select_contact),
        )
        .route("/api/v1/session/message", post(post_message))
        .route("/api/v1/session/charges", post(file_charges))
        .route("/api/v1/session/reset", post(reset_case))
        .route("/api/v1/session/stream", get(stream_session))
        .route("/api/v1/progression", get(get_progression))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
