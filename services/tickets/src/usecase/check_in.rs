use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::{EventRepository, TicketRepository};
use crate::domain::types::{Ticket, TicketStatus};
use crate::error::TicketsServiceError;

/// One-way `active → checked_in` transition, performed by the event's
/// host or a co-host at the door.
pub struct CheckInTicketUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub tickets: T,
    pub events: E,
}

impl<T, E> CheckInTicketUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub async fn execute(
        &self,
        ticket_number: &str,
        staff_id: Uuid,
    ) -> Result<Ticket, TicketsServiceError> {
        let ticket = self
            .tickets
            .find_by_number(ticket_number)
            .await?
            .ok_or(TicketsServiceError::TicketNotFound)?;
        let event = self
            .events
            .find_by_id(ticket.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if !event.is_hosted_by(staff_id) {
            return Err(TicketsServiceError::Forbidden);
        }
        if ticket.status != TicketStatus::Active {
            return Err(TicketsServiceError::InvalidTicketState);
        }

        let now = Utc::now();
        // Conditional update — if the status moved between the read above
        // and here, the transition is refused rather than double-applied.
        if !self.tickets.set_checked_in(ticket.id, staff_id, now).await? {
            return Err(TicketsServiceError::InvalidTicketState);
        }

        Ok(Ticket {
            status: TicketStatus::CheckedIn,
            check_in_time: Some(now),
            checked_in_by: Some(staff_id),
            updated_at: now,
            ..ticket
        })
    }
}

/// `active → cancelled` transition by the ticket owner, the host, or a
/// co-host. A checked-in ticket cannot be cancelled (no un-attend).
pub struct CancelTicketUseCase<T, E>
where
    T: TicketRepository,
    E: EventRepository,
{
    pub tickets: T,
    pub events: E,
}

impl<T, E> CancelTicketUseCase<T, E>
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
        let event = self
            .events
            .find_by_id(ticket.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        if ticket.user_id != actor_id && !event.is_hosted_by(actor_id) {
            return Err(TicketsServiceError::Forbidden);
        }
        if ticket.status != TicketStatus::Active {
            return Err(TicketsServiceError::InvalidTicketState);
        }

        if !self.tickets.set_cancelled(ticket.id).await? {
            return Err(TicketsServiceError::InvalidTicketState);
        }

        Ok(Ticket {
            status: TicketStatus::Cancelled,
            updated_at: Utc::now(),
            ..ticket
        })
    }
}
