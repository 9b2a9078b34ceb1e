#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use utsav_domain::pagination::PageRequest;

use crate::domain::types::{
    CreateOrderRequest, Event, GatewayOrder, GatewaySession, HostAlert, Participant,
    RegistrationEmail, RegistrationOutcome, Ticket, TicketInsertOutcome, UserProfile,
};
use crate::error::TicketsServiceError;

/// Repository for tickets. The store owns both uniqueness constraints:
/// the ticket number and the (user, event) pair.
pub trait TicketRepository: Clone + Send + Sync {
    async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Ticket>, TicketsServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, TicketsServiceError>;

    async fn find_by_number(&self, number: &str) -> Result<Option<Ticket>, TicketsServiceError>;

    async fn exists_number(&self, number: &str) -> Result<bool, TicketsServiceError>;

    /// Insert a ticket, classifying a unique-constraint rejection by which
    /// constraint fired. Never errors on a constraint violation.
    async fn create(&self, ticket: &Ticket) -> Result<TicketInsertOutcome, TicketsServiceError>;

    /// Conditional `active → checked_in` transition. Returns `false` when
    /// the ticket was not in `active` at update time.
    async fn set_checked_in(
        &self,
        id: Uuid,
        staff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError>;

    /// Conditional `active → cancelled` transition. Returns `false` when
    /// the ticket was not in `active` at update time.
    async fn set_cancelled(&self, id: Uuid) -> Result<bool, TicketsServiceError>;

    /// Overwrite the QR artifact columns only; identity fields never change.
    async fn update_qr(
        &self,
        id: Uuid,
        qr_code: &str,
        qr_code_url: Option<&str>,
    ) -> Result<(), TicketsServiceError>;

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError>;

    async fn list_by_event(
        &self,
        event_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError>;
}

/// Repository for events and their participant lists.
pub trait EventRepository: Clone + Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, TicketsServiceError>;

    /// Atomically register a participant: insert the participant row and
    /// bump the event counter, capacity-bounded, in one transaction. The
    /// outcome distinguishes duplicate registration from a full event from
    /// a missing event.
    async fn register_participant(
        &self,
        participant: &Participant,
    ) -> Result<RegistrationOutcome, TicketsServiceError>;

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, TicketsServiceError>;
}

/// Repository for referenced user accounts.
pub trait UserRepository: Clone + Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, TicketsServiceError>;
}

/// Port to the external payment gateway. Order lookup is a pure read of
/// existing payment state and safe to retry.
pub trait PaymentGatewayPort: Clone + Send + Sync {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewaySession, TicketsServiceError>;

    async fn fetch_order(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrder>, TicketsServiceError>;
}

/// Port to object storage for QR artifact mirroring. Failures are
/// swallowed (logged) at every call site — the inline artifact suffices.
pub trait ObjectStoragePort: Clone + Send + Sync {
    async fn upload_png(
        &self,
        bytes: Vec<u8>,
        folder: &str,
        public_id: &str,
    ) -> Result<String, anyhow::Error>;
}

// The three side-effect ports below run as detached tasks, so their
// futures must be Send + 'static-capturable; the explicit `impl Future`
// form carries the Send bound that plain `async fn` in traits cannot.

/// Port for confirmation / host mail. Fire-and-forget.
pub trait MailerPort: Clone + Send + Sync + 'static {
    fn send_registration_email(
        &self,
        email: RegistrationEmail,
    ) -> impl std::future::Future<Output = Result<(), anyhow::Error>> + Send;

    fn send_host_alert(
        &self,
        alert: HostAlert,
    ) -> impl std::future::Future<Output = Result<(), anyhow::Error>> + Send;
}

/// Port for in-app notification records. Fire-and-forget.
pub trait NotificationStore: Clone + Send + Sync + 'static {
    fn record(
        &self,
        user_id: Uuid,
        kind: &'static str,
        payload: serde_json::Value,
    ) -> impl std::future::Future<Output = Result<(), anyhow::Error>> + Send;
}

/// Port for the registration analytics feed. Fire-and-forget.
pub trait AnalyticsPort: Clone + Send + Sync + 'static {
    fn record_registration(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        quantity: u32,
    ) -> impl std::future::Future<Output = Result<(), anyhow::Error>> + Send;
}
