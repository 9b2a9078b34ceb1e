use uuid::Uuid;

use utsav_domain::pagination::PageRequest;

use crate::domain::repository::{
    EventRepository, ObjectStoragePort, TicketRepository, UserRepository,
};
use crate::domain::types::Ticket;
use crate::error::TicketsServiceError;
use crate::qr::{self, TicketQrPayload};
use crate::usecase::issue_ticket::{IssueTicketInput, IssueTicketUseCase};

// ── GetTicket (by id, owner or host) ─────────────────────────────────────────

pub struct GetTicketUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub tickets: T,
    pub events: E,
}

impl<T, E> GetTicketUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub async fn execute(
        &self,
        ticket_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Ticket, TicketsServiceError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketsServiceError::TicketNotFound)?;
        if ticket.user_id != actor_id {
            let event = self
                .events
                .find_by_id(ticket.event_id)
                .await?
                .ok_or(TicketsServiceError::EventNotFound)?;
            if !event.is_hosted_by(actor_id) {
                return Err(TicketsServiceError::Forbidden);
            }
        }
        Ok(ticket)
    }
}

// ── GetTicketByIdentifier (id or human-readable number) ──────────────────────

pub struct GetTicketByIdentifierUseCase<T: TicketRepository> {
    pub tickets: T,
}

impl<T: TicketRepository> GetTicketByIdentifierUseCase<T> {
    /// Resolve an identifier by structural validity: a parseable UUID is
    /// an internal id, anything else is tried as a ticket number.
    pub async fn execute(&self, identifier: &str) -> Result<Ticket, TicketsServiceError> {
        let found = match identifier.parse::<Uuid>() {
            Ok(id) => self.tickets.find_by_id(id).await?,
            Err(_) => self.tickets.find_by_number(identifier).await?,
        };
        found.ok_or(TicketsServiceError::TicketNotFound)
    }
}

// ── ListMyTickets ────────────────────────────────────────────────────────────

pub struct ListMyTicketsUseCase<T: TicketRepository> {
    pub tickets: T,
}

impl<T: TicketRepository> ListMyTicketsUseCase<T> {
    pub async fn execute(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        self.tickets.list_by_user(user_id, page).await
    }
}

// ── ListEventTickets (host/co-host only) ─────────────────────────────────────

pub struct ListEventTicketsUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub tickets: T,
    pub events: E,
}

impl<T, E> ListEventTicketsUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub async fn execute(
        &self,
        event_id: Uuid,
        actor_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        let event = self
            .events
            .find_by_id(event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if !event.is_hosted_by(actor_id) {
            return Err(TicketsServiceError::Forbidden);
        }
        self.tickets.list_by_event(event_id, page).await
    }
}

// ── RegenerateQr ─────────────────────────────────────────────────────────────

/// Re-derive the QR payload from the ticket's current event/user data and
/// overwrite the stored artifact. Identity fields never change; used when
/// an artifact is suspected stale or corrupted.
pub struct RegenerateQrUseCase<T, E, U, S>
where
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
{
    pub tickets: T,
    pub events: E,
    pub users: U,
    pub storage: S,
    pub check_in_base_url: String,
}

impl<T, E, U, S> RegenerateQrUseCase<T, E, U, S>
where
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
{
    pub async fn execute(
        &self,
        ticket_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Ticket, TicketsServiceError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(TicketsServiceError::TicketNotFound)?;
        let event = self
            .events
            .find_by_id(ticket.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if ticket.user_id != actor_id && !event.is_hosted_by(actor_id) {
            return Err(TicketsServiceError::Forbidden);
        }
        let user = self
            .users
            .find_by_id(ticket.user_id)
            .await?
            .ok_or(TicketsServiceError::UserNotFound)?;

        let payload = TicketQrPayload {
            ticket_number: ticket.ticket_number.clone(),
            event_id: event.id,
            user_id: user.id,
            event_name: event.title.clone(),
            user_name: user.name.clone(),
            date: event.starts_at,
            check_in_url: qr::check_in_url(&self.check_in_base_url, &ticket.ticket_number),
        };
        let qr_code = qr::render_data_url(&payload)?;
        let qr_code_url = match qr::render_png(&payload) {
            Ok(png) => match self
                .storage
                .upload_png(png, "tickets", &ticket.ticket_number)
                .await
            {
                Ok(url) => Some(url),
                Err(error) => {
                    tracing::warn!(%error, ticket_number = %ticket.ticket_number, "qr mirror upload failed");
                    None
                }
            },
            Err(error) => {
                tracing::warn!(%error, "qr png render failed");
                None
            }
        };

        self.tickets
            .update_qr(ticket.id, &qr_code, qr_code_url.as_deref())
            .await?;

        Ok(Ticket {
            qr_code,
            qr_code_url,
            ..ticket
        })
    }
}

// ── GenerateTicket (manual recovery for registered users) ────────────────────

/// Reissue the caller's ticket for an event they are registered to — the
/// recovery path for a registration whose issuance failed. Idempotent:
/// an existing ticket is simply returned.
pub struct GenerateTicketUseCase<T, E, U, S>
where
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
{
    pub tickets: T,
    pub events: E,
    pub users: U,
    pub storage: S,
    pub check_in_base_url: String,
}

impl<T, E, U, S> GenerateTicketUseCase<T, E, U, S>
where
    T: TicketRepository + Clone,
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    S: ObjectStoragePort + Clone,
{
    pub async fn execute(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Ticket, TicketsServiceError> {
        let participant = self
            .events
            .find_participant(event_id, user_id)
            .await?
            .ok_or(TicketsServiceError::NotRegistered)?;

        let issuer = IssueTicketUseCase {
            tickets: self.tickets.clone(),
            events: self.events.clone(),
            users: self.users.clone(),
            storage: self.storage.clone(),
            check_in_base_url: self.check_in_base_url.clone(),
        };
        issuer
            .execute(IssueTicketInput {
                user_id,
                event_id,
                amount: participant.amount_paid,
                payment_id: participant.payment_id.clone(),
                quantity: participant.quantity.max(1) as u32,
                metadata: serde_json::json!({ "order_id": participant.order_id }),
            })
            .await
    }
}
