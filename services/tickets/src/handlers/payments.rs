use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::types::{
    Attendee, Event, GroupTier, NOTIFICATION_PAYMENT_FAILED, Ticket, TicketStatus,
};
use crate::domain::repository::NotificationStore as _;
use crate::error::TicketsServiceError;
use crate::infra::db::{DbEventRepository, DbNotificationStore, DbTicketRepository, DbUserRepository};
use crate::infra::gateway::{self, HttpPaymentGateway};
use crate::infra::notify::HttpNotifier;
use crate::infra::storage::HttpObjectStorage;
use crate::state::AppState;
use crate::usecase::create_order::{CreateOrderInput, CreatePaymentOrderUseCase};
use crate::usecase::register::{
    RegisterForEventUseCase, RegisterInput, RegisterOutput, spawn_detached,
};

const WEBHOOK_TIMESTAMP_HEADER: &str = "x-webhook-timestamp";
const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

const PAYMENT_SUCCESS_WEBHOOK: &str = "PAYMENT_SUCCESS_WEBHOOK";
const PAYMENT_FAILED_WEBHOOK: &str = "PAYMENT_FAILED_WEBHOOK";

type AppRegisterUseCase = RegisterForEventUseCase<
    HttpPaymentGateway,
    DbTicketRepository,
    DbEventRepository,
    DbUserRepository,
    HttpObjectStorage,
    HttpNotifier,
    DbNotificationStore,
    HttpNotifier,
>;

fn register_usecase(state: &AppState) -> AppRegisterUseCase {
    RegisterForEventUseCase {
        gateway: state.gateway.clone(),
        tickets: state.ticket_repo(),
        events: state.event_repo(),
        users: state.user_repo(),
        storage: state.storage.clone(),
        mailer: state.notifier.clone(),
        notifications: state.notification_store(),
        analytics: state.notifier.clone(),
        check_in_base_url: state.check_in_base_url.clone(),
    }
}

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct EventSummaryResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(serialize_with = "utsav_core::serde::to_rfc3339_ms")]
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub currency: String,
    pub price: i64,
}

impl From<Event> for EventSummaryResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            starts_at: event.starts_at,
            currency: event.currency,
            price: event.price,
        }
    }
}

#[derive(Serialize)]
pub struct TicketSummaryResponse {
    pub id: Uuid,
    pub ticket_number: String,
    pub status: TicketStatus,
    pub qr_code: String,
    pub qr_code_url: Option<String>,
    /// Relative download link for the PNG form of the artifact.
    pub qr_download_url: String,
}

impl From<Ticket> for TicketSummaryResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            qr_download_url: format!("/tickets/{}/qr", ticket.id),
            id: ticket.id,
            ticket_number: ticket.ticket_number,
            status: ticket.status,
            qr_code: ticket.qr_code,
            qr_code_url: ticket.qr_code_url,
        }
    }
}

#[derive(Serialize)]
pub struct RegistrationResponse {
    pub event: EventSummaryResponse,
    /// Absent when issuance failed; the registration itself stands and
    /// the ticket is recoverable via `POST /tickets/generate`.
    pub ticket: Option<TicketSummaryResponse>,
}

impl From<RegisterOutput> for RegistrationResponse {
    fn from(out: RegisterOutput) -> Self {
        Self {
            event: out.event.into(),
            ticket: out.ticket.map(TicketSummaryResponse::from),
        }
    }
}

// ── POST /payments/create-order ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateOrderBody {
    pub event_id: Uuid,
    pub quantity: Option<u32>,
    pub group_tier: Option<GroupTier>,
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub payment_session_id: String,
    pub amount: i64,
    pub currency: String,
}

pub async fn create_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<Json<CreateOrderResponse>, TicketsServiceError> {
    let uc = CreatePaymentOrderUseCase {
        gateway: state.gateway.clone(),
        events: state.event_repo(),
        users: state.user_repo(),
        notify_url: state.payment_notify_url.clone(),
    };
    let out = uc
        .execute(CreateOrderInput {
            event_id: body.event_id,
            user_id: auth.user_id,
            quantity: body.quantity,
            group_tier: body.group_tier,
        })
        .await?;
    Ok(Json(CreateOrderResponse {
        order_id: out.order_id,
        payment_session_id: out.payment_session_id,
        amount: out.amount,
        currency: out.currency,
    }))
}

// ── POST /payments/verify-payment ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyPaymentBody {
    pub order_id: String,
    pub event_id: Uuid,
    pub quantity: Option<u32>,
    pub group_tier: Option<GroupTier>,
    pub ticket_type: Option<String>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
}

pub async fn verify_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<VerifyPaymentBody>,
) -> Result<Json<RegistrationResponse>, TicketsServiceError> {
    let uc = register_usecase(&state);
    let out = uc
        .execute(RegisterInput {
            order_id: body.order_id,
            event_id: body.event_id,
            user_id: auth.user_id,
            quantity: body.quantity,
            group_tier: body.group_tier,
            ticket_type: body.ticket_type,
            attendees: body.attendees,
        })
        .await?;
    Ok(Json(out.into()))
}

// ── POST /payments/webhook ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct WebhookEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Deserialize)]
struct WebhookData {
    order: WebhookOrder,
}

#[derive(Deserialize)]
struct WebhookOrder {
    order_id: String,
    #[serde(default)]
    order_tags: WebhookOrderTags,
}

/// Registration context attached to the order at creation time.
#[derive(Deserialize, Default)]
struct WebhookOrderTags {
    event_id: Option<Uuid>,
    user_id: Option<Uuid>,
    quantity: Option<u32>,
}

pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, TicketsServiceError> {
    // Signature first — an unverifiable payload is never parsed.
    let timestamp = headers
        .get(WEBHOOK_TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(TicketsServiceError::InvalidSignature)?;
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(TicketsServiceError::InvalidSignature)?;
    if !gateway::verify_webhook_signature(&state.webhook_secret, timestamp, &body, signature) {
        return Err(TicketsServiceError::InvalidSignature);
    }

    let envelope: WebhookEnvelope =
        serde_json::from_slice(&body).map_err(|_| TicketsServiceError::MissingData)?;

    match envelope.event_type.as_str() {
        PAYMENT_SUCCESS_WEBHOOK => {
            let tags = envelope.data.order.order_tags;
            let (event_id, user_id) = match (tags.event_id, tags.user_id) {
                (Some(e), Some(u)) => (e, u),
                _ => return Err(TicketsServiceError::MissingData),
            };
            let uc = register_usecase(&state);
            uc.execute(RegisterInput {
                order_id: envelope.data.order.order_id,
                event_id,
                user_id,
                quantity: tags.quantity,
                group_tier: None,
                ticket_type: None,
                attendees: Vec::new(),
            })
            .await?;
            Ok(StatusCode::OK)
        }
        PAYMENT_FAILED_WEBHOOK => {
            if let Some(user_id) = envelope.data.order.order_tags.user_id {
                let store = state.notification_store();
                let payload = serde_json::json!({
                    "order_id": envelope.data.order.order_id,
                });
                spawn_detached("payment failed notification", async move {
                    store.record(user_id, NOTIFICATION_PAYMENT_FAILED, payload).await
                });
            }
            Ok(StatusCode::OK)
        }
        other => {
            tracing::info!(event_type = other, "ignoring unknown webhook type");
            Ok(StatusCode::OK)
        }
    }
}
