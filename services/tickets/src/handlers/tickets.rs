use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use utsav_domain::pagination::PageRequest;

use crate::auth::AuthUser;
use crate::domain::types::{Ticket, TicketStatus};
use crate::error::TicketsServiceError;
use crate::state::AppState;
use crate::usecase::check_in::{CancelTicketUseCase, CheckInTicketUseCase};
use crate::usecase::tickets::{
    GenerateTicketUseCase, GetTicketByIdentifierUseCase, GetTicketUseCase,
    ListEventTicketsUseCase, ListMyTicketsUseCase, RegenerateQrUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TicketResponse {
    pub id: Uuid,
    pub ticket_number: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: TicketStatus,
    pub quantity: u32,
    pub price: i64,
    pub payment_id: Option<String>,
    pub qr_code: String,
    pub qr_code_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_by: Option<Uuid>,
    #[serde(serialize_with = "utsav_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            ticket_number: ticket.ticket_number,
            event_id: ticket.event_id,
            user_id: ticket.user_id,
            status: ticket.status,
            quantity: ticket.quantity,
            price: ticket.price,
            payment_id: ticket.payment_id,
            qr_code: ticket.qr_code,
            qr_code_url: ticket.qr_code_url,
            check_in_time: ticket
                .check_in_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            checked_in_by: ticket.checked_in_by,
            created_at: ticket.created_at,
        }
    }
}

/// Door-side view of a ticket: enough to confirm validity, no artifact.
#[derive(Serialize)]
pub struct TicketInfoResponse {
    pub ticket_number: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: TicketStatus,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<String>,
}

impl From<Ticket> for TicketInfoResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_number: ticket.ticket_number,
            event_id: ticket.event_id,
            user_id: ticket.user_id,
            status: ticket.status,
            quantity: ticket.quantity,
            check_in_time: ticket
                .check_in_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

// ── GET /tickets/my-tickets ──────────────────────────────────────────────────

pub async fn get_my_tickets(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<TicketResponse>>, TicketsServiceError> {
    let uc = ListMyTicketsUseCase {
        tickets: state.ticket_repo(),
    };
    let tickets = uc.execute(auth.user_id, page).await?;
    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

// ── GET /tickets/{id} ────────────────────────────────────────────────────────

pub async fn get_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketResponse>, TicketsServiceError> {
    let uc = GetTicketUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
    };
    let ticket = uc.execute(ticket_id, auth.user_id).await?;
    Ok(Json(ticket.into()))
}

// ── GET /tickets/{id}/qr ─────────────────────────────────────────────────────

pub async fn get_ticket_qr(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, TicketsServiceError> {
    let uc = GetTicketUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
    };
    let ticket = uc.execute(ticket_id, auth.user_id).await?;
    let png = ticket
        .qr_code
        .strip_prefix("data:image/png;base64,")
        .and_then(|b64| STANDARD.decode(b64).ok())
        .ok_or_else(|| anyhow::anyhow!("stored qr artifact is not a png data url"))?;
    Ok(([(CONTENT_TYPE, "image/png")], png))
}

// ── POST /tickets/generate ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct GenerateTicketRequest {
    pub event_id: Uuid,
}

pub async fn generate_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<GenerateTicketRequest>,
) -> Result<Json<TicketResponse>, TicketsServiceError> {
    let uc = GenerateTicketUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
        users: state.user_repo(),
        storage: state.storage.clone(),
        check_in_base_url: state.check_in_base_url.clone(),
    };
    let ticket = uc.execute(body.event_id, auth.user_id).await?;
    Ok(Json(ticket.into()))
}

// ── GET /tickets/info/{ticket_number} ────────────────────────────────────────

pub async fn get_ticket_info(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<TicketInfoResponse>, TicketsServiceError> {
    let uc = GetTicketByIdentifierUseCase {
        tickets: state.ticket_repo(),
    };
    let ticket = uc.execute(&identifier).await?;
    Ok(Json(ticket.into()))
}

// ── POST /tickets/check-in/{ticket_number} ───────────────────────────────────

pub async fn check_in_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_number): Path<String>,
) -> Result<Json<TicketResponse>, TicketsServiceError> {
    let uc = CheckInTicketUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
    };
    let ticket = uc.execute(&ticket_number, auth.user_id).await?;
    Ok(Json(ticket.into()))
}

// ── GET /tickets/event/{event_id} ────────────────────────────────────────────

pub async fn get_event_tickets(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Vec<TicketResponse>>, TicketsServiceError> {
    let uc = ListEventTicketsUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
    };
    let tickets = uc.execute(event_id, auth.user_id, page).await?;
    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

// ── PUT /tickets/{id}/regenerate-qr ──────────────────────────────────────────

pub async fn regenerate_qr(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketResponse>, TicketsServiceError> {
    let uc = RegenerateQrUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
        users: state.user_repo(),
        storage: state.storage.clone(),
        check_in_base_url: state.check_in_base_url.clone(),
    };
    let ticket = uc.execute(ticket_id, auth.user_id).await?;
    Ok(Json(ticket.into()))
}

// ── DELETE /tickets/{id} ─────────────────────────────────────────────────────

pub async fn cancel_ticket(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketResponse>, TicketsServiceError> {
    let uc = CancelTicketUseCase {
        tickets: state.ticket_repo(),
        events: state.event_repo(),
    };
    let ticket = uc.execute(ticket_id, auth.user_id).await?;
    Ok(Json(ticket.into()))
}
