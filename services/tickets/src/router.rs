use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use utsav_core::health::{healthz, readyz};
use utsav_core::middleware::request_id_layer;

use crate::handlers::{
    payments::{create_order, payment_webhook, verify_payment},
    tickets::{
        cancel_ticket, check_in_ticket, generate_ticket, get_event_tickets, get_my_tickets,
        get_ticket, get_ticket_info, get_ticket_qr, regenerate_qr,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Payments
        .route("/payments/create-order", post(create_order))
        .route("/payments/verify-payment", post(verify_payment))
        .route("/payments/webhook", post(payment_webhook))
        // Tickets
        .route("/tickets/my-tickets", get(get_my_tickets))
        .route("/tickets/generate", post(generate_ticket))
        .route("/tickets/info/{ticket_number}", get(get_ticket_info))
        .route("/tickets/check-in/{ticket_number}", post(check_in_ticket))
        .route("/tickets/event/{event_id}", get(get_event_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}", delete(cancel_ticket))
        .route("/tickets/{id}/qr", get(get_ticket_qr))
        .route("/tickets/{id}/regenerate-qr", put(regenerate_qr))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
