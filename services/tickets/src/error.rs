use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Tickets service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum TicketsServiceError {
    #[error("event not found")]
    EventNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("ticket not found")]
    TicketNotFound,
    #[error("payment not found")]
    PaymentNotFound,
    #[error("payment not successful")]
    PaymentNotSuccessful,
    #[error("already registered for this event")]
    AlreadyRegistered,
    #[error("event is full")]
    EventFull,
    #[error("not registered for this event")]
    NotRegistered,
    #[error("invalid ticket state")]
    InvalidTicketState,
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("missing data")]
    MissingData,
    #[error("payment gateway unavailable")]
    GatewayUnavailable,
    #[error("ticket number space exhausted")]
    TicketNumberExhausted,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl TicketsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EventNotFound => "EVENT_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::TicketNotFound => "TICKET_NOT_FOUND",
            Self::PaymentNotFound => "PAYMENT_NOT_FOUND",
            Self::PaymentNotSuccessful => "PAYMENT_NOT_SUCCESSFUL",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::EventFull => "EVENT_FULL",
            Self::NotRegistered => "NOT_REGISTERED",
            Self::InvalidTicketState => "INVALID_TICKET_STATE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::MissingData => "MISSING_DATA",
            Self::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            Self::TicketNumberExhausted => "TICKET_NUMBER_EXHAUSTED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for TicketsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::EventNotFound
            | Self::UserNotFound
            | Self::TicketNotFound
            | Self::PaymentNotFound => StatusCode::NOT_FOUND,
            Self::PaymentNotSuccessful => StatusCode::PAYMENT_REQUIRED,
            Self::AlreadyRegistered
            | Self::EventFull
            | Self::NotRegistered
            | Self::InvalidTicketState => StatusCode::CONFLICT,
            Self::Unauthorized | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::MissingData => StatusCode::BAD_REQUEST,
            Self::GatewayUnavailable => StatusCode::BAD_GATEWAY,
            Self::TicketNumberExhausted | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status
        // for all requests. 4xx are expected client errors.
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = "INTERNAL", "internal error");
            }
            Self::TicketNumberExhausted => {
                tracing::error!(kind = self.kind(), "ticket number generation exhausted");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
