use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hard upper bound on spots a single ticket may claim.
pub const MAX_TICKET_QUANTITY: u32 = 10;

/// Attempts at minting a fresh ticket number before giving up.
pub const TICKET_NUMBER_MAX_ATTEMPTS: u32 = 5;

/// Ticket lifecycle. `checked_in`, `cancelled`, and `refunded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Active,
    CheckedIn,
    Cancelled,
    Refunded,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::CheckedIn => "checked_in",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "checked_in" => Some(Self::CheckedIn),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Durable proof-of-registration for one (user, event) pair.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: Uuid,
    pub ticket_number: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: TicketStatus,
    pub quantity: u32,
    /// Minor currency units.
    pub price: i64,
    pub payment_id: Option<String>,
    /// Inline QR artifact as a base64 PNG data URL.
    pub qr_code: String,
    /// Best-effort object-storage mirror of the artifact.
    pub qr_code_url: Option<String>,
    pub metadata: serde_json::Value,
    pub check_in_time: Option<DateTime<Utc>>,
    pub checked_in_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event as seen by the tickets service.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub host_id: Uuid,
    pub co_host_ids: Vec<Uuid>,
    /// Price per spot in minor currency units.
    pub price: i64,
    pub currency: String,
    pub max_participants: i32,
    pub current_participants: i32,
}

impl Event {
    /// Whether `user_id` is the host or a co-host.
    pub fn is_hosted_by(&self, user_id: Uuid) -> bool {
        self.host_id == user_id || self.co_host_ids.contains(&user_id)
    }
}

/// Account data read for QR payloads and confirmation mail.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// One user's registration row on an event.
#[derive(Debug, Clone)]
pub struct Participant {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub status: String,
    pub quantity: i32,
    pub payment_status: String,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    /// Minor currency units.
    pub amount_paid: i64,
}

/// Multi-person pricing tier; when present with `people > 0` it overrides
/// the manually requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTier {
    pub name: String,
    pub people: u32,
}

/// An additional person sharing a multi-spot ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

/// Effective spot count for a registration: a group tier with people wins,
/// otherwise the requested quantity clamped to [1, MAX_TICKET_QUANTITY].
pub fn resolve_quantity(requested: Option<u32>, group_tier: Option<&GroupTier>) -> u32 {
    match group_tier {
        Some(tier) if tier.people > 0 => tier.people,
        _ => requested.unwrap_or(1).clamp(1, MAX_TICKET_QUANTITY),
    }
}

/// Result of a ticket insert, classified by which constraint fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketInsertOutcome {
    Created,
    /// The (user, event) pair index fired — a concurrent issuance won.
    UserEventConflict,
    /// The ticket-number constraint fired — regenerate and retry.
    NumberConflict,
}

/// Result of the atomic registration transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    AlreadyRegistered,
    Full,
    EventMissing,
}

/// Status of one payment attempt at the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAttemptStatus {
    Success,
    Pending,
    Failed,
}

impl PaymentAttemptStatus {
    /// Map the gateway's status strings; anything unknown counts as failed.
    pub fn parse(s: &str) -> Self {
        match s {
            "SUCCESS" => Self::Success,
            "PENDING" | "NOT_ATTEMPTED" => Self::Pending,
            _ => Self::Failed,
        }
    }
}

/// One payment attempt against a gateway order.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub gateway_payment_id: String,
    pub status: PaymentAttemptStatus,
    /// Minor currency units.
    pub amount: i64,
}

/// Gateway order state: the order id plus every payment attempt against it.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub attempts: Vec<PaymentAttempt>,
}

impl GatewayOrder {
    pub fn successful_attempt(&self) -> Option<&PaymentAttempt> {
        self.attempts
            .iter()
            .find(|a| a.status == PaymentAttemptStatus::Success)
    }
}

/// Order-creation request passed to the gateway.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub order_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub customer_id: Uuid,
    pub customer_email: String,
    pub notify_url: Option<String>,
}

/// Gateway response to order creation.
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub order_id: String,
    pub payment_session_id: String,
}

/// Confirmation mail payload for the registrant or an additional attendee.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationEmail {
    pub to_email: String,
    pub to_name: String,
    pub event_title: String,
    pub starts_at: DateTime<Utc>,
    pub ticket_number: Option<String>,
    pub qr_code_url: Option<String>,
    pub quantity: u32,
}

/// Host-facing notification payload about a new registration.
#[derive(Debug, Clone, Serialize)]
pub struct HostAlert {
    pub to_email: String,
    pub event_title: String,
    pub registrant_name: String,
    pub quantity: u32,
}

/// In-app notification kinds written by this service.
pub const NOTIFICATION_REGISTRATION_CONFIRMED: &str = "registration_confirmed";
pub const NOTIFICATION_PAYMENT_FAILED: &str = "payment_failed";
