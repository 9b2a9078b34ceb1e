use axum::http::StatusCode;

/// `GET /healthz` — liveness probe.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz` — readiness probe. Services that hold connections can
/// wrap this with their own checks; the default always reports ready.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
