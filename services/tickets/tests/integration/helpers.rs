use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use utsav_domain::pagination::PageRequest;
use utsav_tickets::domain::repository::{
    AnalyticsPort, EventRepository, MailerPort, NotificationStore, ObjectStoragePort,
    PaymentGatewayPort, TicketRepository, UserRepository,
};
use utsav_tickets::domain::types::{
    CreateOrderRequest, Event, GatewayOrder, GatewaySession, HostAlert, Participant,
    PaymentAttempt, PaymentAttemptStatus, RegistrationEmail, RegistrationOutcome, Ticket,
    TicketInsertOutcome, TicketStatus, UserProfile,
};
use utsav_tickets::error::TicketsServiceError;

pub const CHECK_IN_BASE_URL: &str = "https://app.utsav.test";

// ── MockTicketRepo ───────────────────────────────────────────────────────────

/// In-memory ticket store enforcing the same two uniqueness constraints
/// as the real one. `lookup_misses` simulates the check-then-create race:
/// while positive, pair lookups miss even for stored rows.
#[derive(Clone, Default)]
pub struct MockTicketRepo {
    tickets: Arc<Mutex<Vec<Ticket>>>,
    reserved_numbers: Arc<Mutex<Vec<String>>>,
    lookup_misses: Arc<Mutex<u32>>,
    always_collide: bool,
}

impl MockTicketRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repo whose every ticket number already "exists" — drives the
    /// generation loop to exhaustion.
    pub fn colliding() -> Self {
        Self {
            always_collide: true,
            ..Self::default()
        }
    }

    pub fn with_lookup_misses(self, misses: u32) -> Self {
        *self.lookup_misses.lock().unwrap() = misses;
        self
    }

    pub fn seed(&self, ticket: Ticket) {
        self.tickets.lock().unwrap().push(ticket);
    }

    pub fn reserve_number(&self, number: &str) {
        self.reserved_numbers.lock().unwrap().push(number.to_owned());
    }

    pub fn count(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }

    pub fn get(&self, id: Uuid) -> Option<Ticket> {
        self.tickets.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }
}

impl TicketRepository for MockTicketRepo {
    async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Ticket>, TicketsServiceError> {
        {
            let mut misses = self.lookup_misses.lock().unwrap();
            if *misses > 0 {
                *misses -= 1;
                return Ok(None);
            }
        }
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.user_id == user_id && t.event_id == event_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, TicketsServiceError> {
        Ok(self.tickets.lock().unwrap().iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Ticket>, TicketsServiceError> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.ticket_number == number)
            .cloned())
    }

    async fn exists_number(&self, number: &str) -> Result<bool, TicketsServiceError> {
        if self.always_collide {
            return Ok(true);
        }
        let in_store = self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.ticket_number == number);
        let reserved = self
            .reserved_numbers
            .lock()
            .unwrap()
            .iter()
            .any(|n| n == number);
        Ok(in_store || reserved)
    }

    async fn create(
        &self,
        ticket: &Ticket,
    ) -> Result<TicketInsertOutcome, TicketsServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        if tickets
            .iter()
            .any(|t| t.user_id == ticket.user_id && t.event_id == ticket.event_id)
        {
            return Ok(TicketInsertOutcome::UserEventConflict);
        }
        if tickets.iter().any(|t| t.ticket_number == ticket.ticket_number) {
            return Ok(TicketInsertOutcome::NumberConflict);
        }
        tickets.push(ticket.clone());
        Ok(TicketInsertOutcome::Created)
    }

    async fn set_checked_in(
        &self,
        id: Uuid,
        staff_id: Uuid,
        at: chrono::DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets
            .iter_mut()
            .find(|t| t.id == id && t.status == TicketStatus::Active)
        {
            Some(t) => {
                t.status = TicketStatus::CheckedIn;
                t.check_in_time = Some(at);
                t.checked_in_by = Some(staff_id);
                t.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_cancelled(&self, id: Uuid) -> Result<bool, TicketsServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        match tickets
            .iter_mut()
            .find(|t| t.id == id && t.status == TicketStatus::Active)
        {
            Some(t) => {
                t.status = TicketStatus::Cancelled;
                t.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_qr(
        &self,
        id: Uuid,
        qr_code: &str,
        qr_code_url: Option<&str>,
    ) -> Result<(), TicketsServiceError> {
        let mut tickets = self.tickets.lock().unwrap();
        if let Some(t) = tickets.iter_mut().find(|t| t.id == id) {
            t.qr_code = qr_code.to_owned();
            t.qr_code_url = qr_code_url.map(ToOwned::to_owned);
            t.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        _page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        _page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        Ok(self
            .tickets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect())
    }
}

// ── MockEventRepo ────────────────────────────────────────────────────────────

/// In-memory event store with the atomic registration semantics of the
/// real one: duplicate guard first, then a capacity-bounded counter bump,
/// all under one lock.
#[derive(Clone, Default)]
pub struct MockEventRepo {
    inner: Arc<Mutex<EventState>>,
}

#[derive(Default)]
struct EventState {
    events: Vec<Event>,
    participants: Vec<Participant>,
}

impl MockEventRepo {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventState {
                events,
                participants: vec![],
            })),
        }
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.inner.lock().unwrap().participants.clone()
    }

    pub fn current_participants(&self, event_id: Uuid) -> i32 {
        self.inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| e.current_participants)
            .unwrap_or(0)
    }
}

impl EventRepository for MockEventRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, TicketsServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn register_participant(
        &self,
        participant: &Participant,
    ) -> Result<RegistrationOutcome, TicketsServiceError> {
        let mut state = self.inner.lock().unwrap();
        if state
            .participants
            .iter()
            .any(|p| p.event_id == participant.event_id && p.user_id == participant.user_id)
        {
            return Ok(RegistrationOutcome::AlreadyRegistered);
        }
        let Some(event) = state
            .events
            .iter_mut()
            .find(|e| e.id == participant.event_id)
        else {
            return Ok(RegistrationOutcome::EventMissing);
        };
        if event.current_participants + participant.quantity > event.max_participants {
            return Ok(RegistrationOutcome::Full);
        }
        event.current_participants += participant.quantity;
        state.participants.push(participant.clone());
        Ok(RegistrationOutcome::Registered)
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, TicketsServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
            .cloned())
    }
}

// ── MockUserRepo ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockUserRepo {
    users: Arc<Mutex<Vec<UserProfile>>>,
}

impl MockUserRepo {
    pub fn new(users: Vec<UserProfile>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn add(&self, user: UserProfile) {
        self.users.lock().unwrap().push(user);
    }
}

impl UserRepository for MockUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, TicketsServiceError> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }
}

// ── MockGateway ──────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockGateway {
    orders: Arc<Mutex<HashMap<String, GatewayOrder>>>,
}

impl MockGateway {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_order(self, order: GatewayOrder) -> Self {
        self.orders
            .lock()
            .unwrap()
            .insert(order.order_id.clone(), order);
        self
    }
}

impl PaymentGatewayPort for MockGateway {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewaySession, TicketsServiceError> {
        Ok(GatewaySession {
            order_id: request.order_id.clone(),
            payment_session_id: format!("session_{}", request.order_id),
        })
    }

    async fn fetch_order(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrder>, TicketsServiceError> {
        Ok(self.orders.lock().unwrap().get(order_id).cloned())
    }
}

// ── MockStorage ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Default)]
pub struct MockStorage {
    pub fail: bool,
}

impl MockStorage {
    pub fn working() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl ObjectStoragePort for MockStorage {
    async fn upload_png(
        &self,
        _bytes: Vec<u8>,
        folder: &str,
        public_id: &str,
    ) -> Result<String, anyhow::Error> {
        if self.fail {
            anyhow::bail!("storage unavailable");
        }
        Ok(format!("https://cdn.utsav.test/{folder}/{public_id}.png"))
    }
}

// ── Mock side-effect ports ───────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<RegistrationEmail>>>,
    pub alerts: Arc<Mutex<Vec<HostAlert>>>,
}

impl MailerPort for MockMailer {
    async fn send_registration_email(
        &self,
        email: RegistrationEmail,
    ) -> Result<(), anyhow::Error> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }

    async fn send_host_alert(&self, alert: HostAlert) -> Result<(), anyhow::Error> {
        self.alerts.lock().unwrap().push(alert);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockNotificationStore {
    pub records: Arc<Mutex<Vec<(Uuid, String)>>>,
}

impl NotificationStore for MockNotificationStore {
    async fn record(
        &self,
        user_id: Uuid,
        kind: &'static str,
        _payload: serde_json::Value,
    ) -> Result<(), anyhow::Error> {
        self.records.lock().unwrap().push((user_id, kind.to_owned()));
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MockAnalytics {
    pub records: Arc<Mutex<Vec<(Uuid, Uuid, u32)>>>,
}

impl AnalyticsPort for MockAnalytics {
    async fn record_registration(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        quantity: u32,
    ) -> Result<(), anyhow::Error> {
        self.records.lock().unwrap().push((user_id, event_id, quantity));
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_user(name: &str) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

pub fn test_event(host_id: Uuid, max_participants: i32) -> Event {
    Event {
        id: Uuid::new_v4(),
        title: "Rooftop mixer".to_owned(),
        starts_at: Utc::now() + chrono::Duration::days(7),
        host_id,
        co_host_ids: vec![],
        price: 50_000,
        currency: "INR".to_owned(),
        max_participants,
        current_participants: 0,
    }
}

pub fn paid_order(order_id: &str, amount: i64) -> GatewayOrder {
    GatewayOrder {
        order_id: order_id.to_owned(),
        attempts: vec![PaymentAttempt {
            gateway_payment_id: "9000001".to_owned(),
            status: PaymentAttemptStatus::Success,
            amount,
        }],
    }
}

pub fn failed_order(order_id: &str, amount: i64) -> GatewayOrder {
    GatewayOrder {
        order_id: order_id.to_owned(),
        attempts: vec![PaymentAttempt {
            gateway_payment_id: "9000002".to_owned(),
            status: PaymentAttemptStatus::Failed,
            amount,
        }],
    }
}
