use uuid::Uuid;

use crate::domain::repository::{EventRepository, PaymentGatewayPort, UserRepository};
use crate::domain::types::{CreateOrderRequest, GroupTier, resolve_quantity};
use crate::error::TicketsServiceError;

pub struct CreateOrderInput {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub quantity: Option<u32>,
    pub group_tier: Option<GroupTier>,
}

pub struct CreateOrderOutput {
    pub order_id: String,
    pub payment_session_id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
}

/// Create a gateway payment order for an event registration. No local
/// order record is kept — the gateway is the source of payment truth and
/// the order id ties the later verification back to it.
pub struct CreatePaymentOrderUseCase<G, E, U>
where
    G: PaymentGatewayPort,
    E: EventRepository,
    U: UserRepository,
{
    pub gateway: G,
    pub events: E,
    pub users: U,
    /// Webhook URL handed to the gateway, when publicly reachable.
    pub notify_url: Option<String>,
}

impl<G, E, U> CreatePaymentOrderUseCase<G, E, U>
where
    G: PaymentGatewayPort,
    E: EventRepository,
    U: UserRepository,
{
    pub async fn execute(
        &self,
        input: CreateOrderInput,
    ) -> Result<CreateOrderOutput, TicketsServiceError> {
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

        let quantity = resolve_quantity(input.quantity, input.group_tier.as_ref());
        let amount = event.price * quantity as i64;
        let order_id = format!("ord_{}", Uuid::new_v4().simple());

        let session = self
            .gateway
            .create_order(&CreateOrderRequest {
                order_id,
                amount,
                currency: event.currency.clone(),
                customer_id: user.id,
                customer_email: user.email,
                notify_url: self.notify_url.clone(),
            })
            .await?;

        Ok(CreateOrderOutput {
            order_id: session.order_id,
            payment_session_id: session.payment_session_id,
            amount,
            currency: event.currency,
        })
    }
}
