use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionError,
    TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use utsav_domain::pagination::PageRequest;
use utsav_tickets_schema::{event_participants, events, notifications, tickets, users};

use crate::domain::repository::{
    EventRepository, NotificationStore, TicketRepository, UserRepository,
};
use crate::domain::types::{
    Event, Participant, RegistrationOutcome, Ticket, TicketInsertOutcome, TicketStatus,
    UserProfile,
};
use crate::error::TicketsServiceError;

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

// ── Ticket repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTicketRepository {
    pub db: DatabaseConnection,
}

impl TicketRepository for DbTicketRepository {
    async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<Ticket>, TicketsServiceError> {
        let model = tickets::Entity::find()
            .filter(tickets::Column::UserId.eq(user_id))
            .filter(tickets::Column::EventId.eq(event_id))
            .one(&self.db)
            .await
            .context("find ticket by user and event")?;
        model.map(ticket_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, TicketsServiceError> {
        let model = tickets::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find ticket by id")?;
        model.map(ticket_from_model).transpose()
    }

    async fn find_by_number(
        &self,
        number: &str,
    ) -> Result<Option<Ticket>, TicketsServiceError> {
        let model = tickets::Entity::find()
            .filter(tickets::Column::TicketNumber.eq(number))
            .one(&self.db)
            .await
            .context("find ticket by number")?;
        model.map(ticket_from_model).transpose()
    }

    async fn exists_number(&self, number: &str) -> Result<bool, TicketsServiceError> {
        let count = tickets::Entity::find()
            .filter(tickets::Column::TicketNumber.eq(number))
            .count(&self.db)
            .await
            .context("count tickets by number")?;
        Ok(count > 0)
    }

    async fn create(
        &self,
        ticket: &Ticket,
    ) -> Result<TicketInsertOutcome, TicketsServiceError> {
        let result = tickets::ActiveModel {
            id: Set(ticket.id),
            ticket_number: Set(ticket.ticket_number.clone()),
            event_id: Set(ticket.event_id),
            user_id: Set(ticket.user_id),
            status: Set(ticket.status.as_str().to_owned()),
            quantity: Set(ticket.quantity as i32),
            price: Set(ticket.price),
            payment_id: Set(ticket.payment_id.clone()),
            qr_code: Set(ticket.qr_code.clone()),
            qr_code_url: Set(ticket.qr_code_url.clone()),
            metadata: Set(ticket.metadata.clone()),
            check_in_time: Set(ticket.check_in_time),
            checked_in_by: Set(ticket.checked_in_by),
            created_at: Set(ticket.created_at),
            updated_at: Set(ticket.updated_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(TicketInsertOutcome::Created),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(constraint))
                    if constraint.contains("ticket_number") =>
                {
                    Ok(TicketInsertOutcome::NumberConflict)
                }
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Ok(TicketInsertOutcome::UserEventConflict)
                }
                _ => Err(anyhow::Error::new(e).context("create ticket").into()),
            },
        }
    }

    async fn set_checked_in(
        &self,
        id: Uuid,
        staff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, TicketsServiceError> {
        let result = tickets::Entity::update_many()
            .filter(tickets::Column::Id.eq(id))
            .filter(tickets::Column::Status.eq(TicketStatus::Active.as_str()))
            .col_expr(
                tickets::Column::Status,
                Expr::value(TicketStatus::CheckedIn.as_str()),
            )
            .col_expr(tickets::Column::CheckInTime, Expr::value(at))
            .col_expr(tickets::Column::CheckedInBy, Expr::value(staff_id))
            .col_expr(tickets::Column::UpdatedAt, Expr::value(at))
            .exec(&self.db)
            .await
            .context("check in ticket")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_cancelled(&self, id: Uuid) -> Result<bool, TicketsServiceError> {
        let result = tickets::Entity::update_many()
            .filter(tickets::Column::Id.eq(id))
            .filter(tickets::Column::Status.eq(TicketStatus::Active.as_str()))
            .col_expr(
                tickets::Column::Status,
                Expr::value(TicketStatus::Cancelled.as_str()),
            )
            .col_expr(tickets::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&self.db)
            .await
            .context("cancel ticket")?;
        Ok(result.rows_affected > 0)
    }

    async fn update_qr(
        &self,
        id: Uuid,
        qr_code: &str,
        qr_code_url: Option<&str>,
    ) -> Result<(), TicketsServiceError> {
        tickets::Entity::update_many()
            .filter(tickets::Column::Id.eq(id))
            .col_expr(tickets::Column::QrCode, Expr::value(qr_code))
            .col_expr(
                tickets::Column::QrCodeUrl,
                Expr::value(qr_code_url.map(ToOwned::to_owned)),
            )
            .col_expr(tickets::Column::UpdatedAt, Expr::value(Utc::now()))
            .exec(&self.db)
            .await
            .context("update ticket qr")?;
        Ok(())
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        let page = page.clamped();
        let models = tickets::Entity::find()
            .filter(tickets::Column::UserId.eq(user_id))
            .order_by_desc(tickets::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.per_page as u64)
            .all(&self.db)
            .await
            .context("list tickets by user")?;
        models.into_iter().map(ticket_from_model).collect()
    }

    async fn list_by_event(
        &self,
        event_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Ticket>, TicketsServiceError> {
        let page = page.clamped();
        let models = tickets::Entity::find()
            .filter(tickets::Column::EventId.eq(event_id))
            .order_by_desc(tickets::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.per_page as u64)
            .all(&self.db)
            .await
            .context("list tickets by event")?;
        models.into_iter().map(ticket_from_model).collect()
    }
}

fn ticket_from_model(model: tickets::Model) -> Result<Ticket, TicketsServiceError> {
    let status = TicketStatus::parse(&model.status)
        .ok_or_else(|| anyhow::anyhow!("unknown ticket status: {}", model.status))?;
    Ok(Ticket {
        id: model.id,
        ticket_number: model.ticket_number,
        event_id: model.event_id,
        user_id: model.user_id,
        status,
        quantity: model.quantity.max(0) as u32,
        price: model.price,
        payment_id: model.payment_id,
        qr_code: model.qr_code,
        qr_code_url: model.qr_code_url,
        metadata: model.metadata,
        check_in_time: model.check_in_time,
        checked_in_by: model.checked_in_by,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Event repository ─────────────────────────────────────────────────────────

/// Rollback marker for the capacity branch of the registration transaction.
const CAPACITY_ROLLBACK: &str = "capacity_bound";

#[derive(Clone)]
pub struct DbEventRepository {
    pub db: DatabaseConnection,
}

impl EventRepository for DbEventRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, TicketsServiceError> {
        let model = events::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find event by id")?;
        model.map(event_from_model).transpose()
    }

    async fn register_participant(
        &self,
        participant: &Participant,
    ) -> Result<RegistrationOutcome, TicketsServiceError> {
        let event_id = participant.event_id;
        let quantity = participant.quantity;
        let participant = participant.clone();

        let result = self
            .db
            .transaction::<_, RegistrationOutcome, DbErr>(|txn| {
                Box::pin(async move {
                    // Participant row first: the compound PK is the
                    // duplicate-registration guard.
                    let insert = event_participants::ActiveModel {
                        event_id: Set(participant.event_id),
                        user_id: Set(participant.user_id),
                        registered_at: Set(participant.registered_at),
                        status: Set(participant.status.clone()),
                        quantity: Set(participant.quantity),
                        payment_status: Set(participant.payment_status.clone()),
                        payment_id: Set(participant.payment_id.clone()),
                        order_id: Set(participant.order_id.clone()),
                        amount_paid: Set(participant.amount_paid),
                    }
                    .insert(txn)
                    .await;

                    match insert {
                        Err(e) if is_unique_violation(&e) => {
                            return Ok(RegistrationOutcome::AlreadyRegistered);
                        }
                        Err(e) => return Err(e),
                        Ok(_) => {}
                    }

                    // Capacity-bounded counter bump. The bound lives in the
                    // match clause, so overshoot is impossible under
                    // concurrent registrations.
                    let updated = events::Entity::update_many()
                        .filter(events::Column::Id.eq(event_id))
                        .filter(
                            Expr::col(events::Column::CurrentParticipants)
                                .add(quantity)
                                .lte(Expr::col(events::Column::MaxParticipants)),
                        )
                        .col_expr(
                            events::Column::CurrentParticipants,
                            Expr::col(events::Column::CurrentParticipants).add(quantity),
                        )
                        .col_expr(events::Column::UpdatedAt, Expr::value(Utc::now()))
                        .exec(txn)
                        .await?;

                    if updated.rows_affected == 0 {
                        // Roll back the participant insert.
                        return Err(DbErr::Custom(CAPACITY_ROLLBACK.to_owned()));
                    }

                    Ok(RegistrationOutcome::Registered)
                })
            })
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(TransactionError::Transaction(DbErr::Custom(marker)))
                if marker == CAPACITY_ROLLBACK =>
            {
                // Error branch only: one extra read to tell a full event
                // from a vanished one.
                let exists = events::Entity::find_by_id(event_id)
                    .count(&self.db)
                    .await
                    .context("classify failed registration")?
                    > 0;
                Ok(if exists {
                    RegistrationOutcome::Full
                } else {
                    RegistrationOutcome::EventMissing
                })
            }
            Err(e) => Err(anyhow::Error::new(e).context("register participant").into()),
        }
    }

    async fn find_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>, TicketsServiceError> {
        let model = event_participants::Entity::find_by_id((event_id, user_id))
            .one(&self.db)
            .await
            .context("find participant")?;
        Ok(model.map(participant_from_model))
    }
}

fn event_from_model(model: events::Model) -> Result<Event, TicketsServiceError> {
    let co_host_ids: Vec<Uuid> = serde_json::from_value(model.co_host_ids)
        .context("parse event co_host_ids")?;
    Ok(Event {
        id: model.id,
        title: model.title,
        starts_at: model.starts_at,
        host_id: model.host_id,
        co_host_ids,
        price: model.price,
        currency: model.currency,
        max_participants: model.max_participants,
        current_participants: model.current_participants,
    })
}

fn participant_from_model(model: event_participants::Model) -> Participant {
    Participant {
        event_id: model.event_id,
        user_id: model.user_id,
        registered_at: model.registered_at,
        status: model.status,
        quantity: model.quantity,
        payment_status: model.payment_status,
        payment_id: model.payment_id,
        order_id: model.order_id,
        amount_paid: model.amount_paid,
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, TicketsServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(|m| UserProfile {
            id: m.id,
            name: m.name,
            email: m.email,
        }))
    }
}

// ── In-app notification store ────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbNotificationStore {
    pub db: DatabaseConnection,
}

impl NotificationStore for DbNotificationStore {
    async fn record(
        &self,
        user_id: Uuid,
        kind: &'static str,
        payload: serde_json::Value,
    ) -> Result<(), anyhow::Error> {
        notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind.to_owned()),
            payload: Set(payload),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .context("record notification")?;
        Ok(())
    }
}
