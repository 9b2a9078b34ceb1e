use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::{
    AnalyticsPort, EventRepository, MailerPort, NotificationStore, ObjectStoragePort,
    PaymentGatewayPort, TicketRepository, UserRepository,
};
use crate::domain::types::{
    Attendee, Event, GroupTier, HostAlert, NOTIFICATION_REGISTRATION_CONFIRMED, Participant,
    RegistrationEmail, RegistrationOutcome, Ticket, UserProfile, resolve_quantity,
};
use crate::error::TicketsServiceError;
use crate::usecase::issue_ticket::{IssueTicketInput, IssueTicketUseCase};

/// Spawn a detached side-effect task with its own error boundary. The
/// response path never awaits these, and one failing never touches the
/// others.
pub fn spawn_detached(
    task: &'static str,
    fut: impl Future<Output = Result<(), anyhow::Error>> + Send + 'static,
) {
    tokio::spawn(async move {
        if let Err(error) = fut.await {
            tracing::warn!(%error, task, "side effect failed");
        }
    });
}

pub struct RegisterInput {
    pub order_id: String,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: Option<u32>,
    pub group_tier: Option<GroupTier>,
    pub ticket_type: Option<String>,
    pub attendees: Vec<Attendee>,
}

pub struct RegisterOutput {
    pub event: Event,
    pub ticket: Option<Ticket>,
}

/// The one place where money, capacity, and ticket issuance meet:
/// confirm the payment at the gateway, atomically reserve capacity,
/// issue (or recover) the ticket, and fan out notifications.
pub struct RegisterForEventUseCase<G, T, E, U, S, M, N, A>
where
    G: PaymentGatewayPort,
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
    M: MailerPort,
    N: NotificationStore,
    A: AnalyticsPort,
{
    pub gateway: G,
    pub tickets: T,
    pub events: E,
    pub users: U,
    pub storage: S,
    pub mailer: M,
    pub notifications: N,
    pub analytics: A,
    pub check_in_base_url: String,
}

impl<G, T, E, U, S, M, N, A> RegisterForEventUseCase<G, T, E, U, S, M, N, A>
where
    G: PaymentGatewayPort,
    T: TicketRepository,
    E: EventRepository,
    U: UserRepository,
    S: ObjectStoragePort,
    M: MailerPort,
    N: NotificationStore,
    A: AnalyticsPort,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<RegisterOutput, TicketsServiceError> {
        // 1-2. Payment truth lives at the gateway.
        let order = self
            .gateway
            .fetch_order(&input.order_id)
            .await?
            .ok_or(TicketsServiceError::PaymentNotFound)?;
        let attempt = order
            .successful_attempt()
            .ok_or(TicketsServiceError::PaymentNotSuccessful)?;
        let payment_id = attempt.gateway_payment_id.clone();
        let amount_paid = attempt.amount;

        // 3. Effective spot count.
        let quantity = resolve_quantity(input.quantity, input.group_tier.as_ref());

        // 4. Atomic capacity-bounded registration.
        let participant = Participant {
            event_id: input.event_id,
            user_id: input.user_id,
            registered_at: Utc::now(),
            status: "confirmed".to_owned(),
            quantity: quantity as i32,
            payment_status: "paid".to_owned(),
            payment_id: Some(payment_id.clone()),
            order_id: Some(input.order_id.clone()),
            amount_paid,
        };
        let fresh = match self.events.register_participant(&participant).await? {
            RegistrationOutcome::Registered => true,
            RegistrationOutcome::AlreadyRegistered => {
                // Same order id → a webhook retry or double submit; replay
                // idempotently. Different order id → genuine duplicate.
                let existing = self
                    .events
                    .find_participant(input.event_id, input.user_id)
                    .await?;
                match existing {
                    Some(p) if p.order_id.as_deref() == Some(input.order_id.as_str()) => false,
                    _ => return Err(TicketsServiceError::AlreadyRegistered),
                }
            }
            RegistrationOutcome::Full => return Err(TicketsServiceError::EventFull),
            RegistrationOutcome::EventMissing => return Err(TicketsServiceError::EventNotFound),
        };

        let event = self
            .events
            .find_by_id(input.event_id)
            .await?
            .ok_or(TicketsServiceError::EventNotFound)?;

        // 5. Issuance failure does not roll back the registration — the
        // user is registered and the ticket is recoverable later.
        let issuer = IssueTicketUseCase {
            tickets: self.tickets.clone(),
            events: self.events.clone(),
            users: self.users.clone(),
            storage: self.storage.clone(),
            check_in_base_url: self.check_in_base_url.clone(),
        };
        let metadata = serde_json::json!({
            "ticket_type": input.ticket_type,
            "base_price": event.price,
            "group_tier": input.group_tier,
            "order_id": input.order_id,
        });
        let ticket = match issuer
            .execute(IssueTicketInput {
                user_id: input.user_id,
                event_id: input.event_id,
                amount: amount_paid,
                payment_id: Some(payment_id),
                quantity,
                metadata,
            })
            .await
        {
            Ok(ticket) => Some(ticket),
            Err(error) => {
                tracing::error!(
                    %error,
                    event_id = %input.event_id,
                    user_id = %input.user_id,
                    "ticket issuance failed after registration"
                );
                None
            }
        };

        // 6. Fire-and-forget side effects, only for a fresh registration.
        if fresh {
            let registrant = self.users.find_by_id(input.user_id).await?;
            self.dispatch_side_effects(
                &event,
                registrant.as_ref(),
                ticket.as_ref(),
                quantity,
                &input.attendees,
            )
            .await?;
        }

        Ok(RegisterOutput { event, ticket })
    }

    async fn dispatch_side_effects(
        &self,
        event: &Event,
        registrant: Option<&UserProfile>,
        ticket: Option<&Ticket>,
        quantity: u32,
        attendees: &[Attendee],
    ) -> Result<(), TicketsServiceError> {
        let ticket_number = ticket.map(|t| t.ticket_number.clone());
        let qr_code_url = ticket.and_then(|t| t.qr_code_url.clone());

        if let Some(registrant) = registrant {
            let email = RegistrationEmail {
                to_email: registrant.email.clone(),
                to_name: registrant.name.clone(),
                event_title: event.title.clone(),
                starts_at: event.starts_at,
                ticket_number: ticket_number.clone(),
                qr_code_url: qr_code_url.clone(),
                quantity,
            };
            let mailer = self.mailer.clone();
            spawn_detached("registration email", async move {
                mailer.send_registration_email(email).await
            });

            for attendee in attendees {
                let email = RegistrationEmail {
                    to_email: attendee.email.clone(),
                    to_name: attendee.name.clone(),
                    event_title: event.title.clone(),
                    starts_at: event.starts_at,
                    ticket_number: ticket_number.clone(),
                    qr_code_url: qr_code_url.clone(),
                    quantity,
                };
                let mailer = self.mailer.clone();
                spawn_detached("attendee email", async move {
                    mailer.send_registration_email(email).await
                });
            }

            if let Some(host) = self.users.find_by_id(event.host_id).await? {
                let alert = HostAlert {
                    to_email: host.email,
                    event_title: event.title.clone(),
                    registrant_name: registrant.name.clone(),
                    quantity,
                };
                let mailer = self.mailer.clone();
                spawn_detached("host alert", async move { mailer.send_host_alert(alert).await });
            }

            let notifications = self.notifications.clone();
            let user_id = registrant.id;
            let payload = serde_json::json!({
                "event_id": event.id,
                "event_title": event.title,
                "ticket_number": ticket_number,
            });
            spawn_detached("in-app notification", async move {
                notifications
                    .record(user_id, NOTIFICATION_REGISTRATION_CONFIRMED, payload)
                    .await
            });

            let analytics = self.analytics.clone();
            let event_id = event.id;
            spawn_detached("registration analytics", async move {
                analytics.record_registration(user_id, event_id, quantity).await
            });
        }

        Ok(())
    }
}
