use chrono::Utc;
use rand::RngExt;
use uuid::Uuid;

use utsav_domain::ticket_number;

use crate::domain::repository::{
    EventRepository, ObjectStoragePort, TicketRepository, UserRepository,
};
use crate::domain::types::{
    TICKET_NUMBER_MAX_ATTEMPTS, Ticket, TicketInsertOutcome, TicketStatus,
};
use crate::error::TicketsServiceError;
use crate::qr::{self, TicketQrPayload};

/// Storage folder for mirrored QR artifacts.
const QR_STORAGE_FOLDER: &str = "tickets";

const SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Mint one ticket-number candidate: current epoch millis plus a random
/// base36 suffix.
pub fn random_ticket_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ticket_number::SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    ticket_number::compose(Utc::now().timestamp_millis(), &suffix)
}

/// Generate a ticket number not currently present in the store. Every
/// retry is a full regeneration (fresh timestamp and suffix), bounded at
/// `TICKET_NUMBER_MAX_ATTEMPTS`.
pub async fn generate_unique_ticket_number<T: TicketRepository>(
    tickets: &T,
) -> Result<String, TicketsServiceError> {
    for _ in 0..TICKET_NUMBER_MAX_ATTEMPTS {
        let candidate = random_ticket_number();
        if !tickets.exists_number(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(TicketsServiceError::TicketNumberExhausted)
}

pub struct IssueTicketInput {
    pub user_id: Uuid,
    pub event_id: Uuid,
    /// Minor currency units.
    pub amount: i64,
    pub payment_id: Option<String>,
    pub quantity: u32,
    pub metadata: serde_json::Value,
}

/// Single entry point for "give me the ticket for this user and event",
/// idempotent by construction: the existence check runs before any
/// mutation, and the store's (user, event) constraint catches the race
/// the check cannot.
pub struct IssueTicketUseCase<T, E, U, S>
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

impl<T, E, U, S> IssueTicketUseCase<T, E, U, S>
where
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
{
    pub async fn execute(&self, input: IssueTicketInput) -> Result<Ticket, TicketsServiceError> {
        // Idempotency: an existing ticket is returned verbatim, original
        // QR artifact included, before anything is validated or written.
        if let Some(existing) = self
            .tickets
            .find_by_user_and_event(input.user_id, input.event_id)
            .await?
        {
            return Ok(existing);
        }

        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;
        let user = self
            .users
            .find_by_id(input.user_id)
            .await?
            .ok_or(TicketsServiceError::UserNotFound)?;

        for _ in 0..TICKET_NUMBER_MAX_ATTEMPTS {
            let number = generate_unique_ticket_number(&self.tickets).await?;

            let payload = TicketQrPayload {
                ticket_number: number.clone(),
                event_id: event.id,
                user_id: user.id,
                event_name: event.title.clone(),
                user_name: user.name.clone(),
                date: event.starts_at,
                check_in_url: qr::check_in_url(&self.check_in_base_url, &number),
            };
            let qr_code = qr::render_data_url(&payload)?;

            let qr_code_url = match qr::render_png(&payload) {
                Ok(png) => match self
                    .storage
                    .upload_png(png, QR_STORAGE_FOLDER, &number)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(error) => {
                        tracing::warn!(%error, ticket_number = %number, "qr mirror upload failed");
                        None
                    }
                },
                Err(error) => {
                    tracing::warn!(%error, ticket_number = %number, "qr png render failed");
                    None
                }
            };

            let now = Utc::now();
            let ticket = Ticket {
                id: Uuid::new_v4(),
                ticket_number: number,
                event_id: event.id,
                user_id: user.id,
                status: TicketStatus::Active,
                quantity: input.quantity,
                price: input.amount,
                payment_id: input.payment_id.clone(),
                qr_code,
                qr_code_url,
                metadata: input.metadata.clone(),
                check_in_time: None,
                checked_in_by: None,
                created_at: now,
                updated_at: now,
            };

            match self.tickets.create(&ticket).await? {
                TicketInsertOutcome::Created => return Ok(ticket),
                TicketInsertOutcome::UserEventConflict => {
                    // A concurrent issuance won the pair index; the loser
                    // observes the winner's record instead of erroring.
                    return self
                        .tickets
                        .find_by_user_and_event(input.user_id, input.event_id)
                        .await?
                        .ok_or_else(|| {
                            anyhow::anyhow!("conflicting ticket vanished after insert race").into()
                        });
                }
                TicketInsertOutcome::NumberConflict => continue,
            }
        }

        Err(TicketsServiceError::TicketNumberExhausted)
    }
}
