use sea_orm::Database;
use tracing::info;

use utsav_tickets::config::TicketsConfig;
use utsav_tickets::infra::gateway::HttpPaymentGateway;
use utsav_tickets::infra::notify::HttpNotifier;
use utsav_tickets::infra::storage::HttpObjectStorage;
use utsav_tickets::router::build_router;
use utsav_tickets::state::AppState;

#[tokio::main]
async fn main() {
    utsav_core::tracing::init_tracing();

    let config = TicketsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let webhook_secret = config.gateway.webhook_secret.clone();
    let gateway =
        HttpPaymentGateway::new(config.gateway).expect("failed to build gateway client");
    let storage = HttpObjectStorage::new(config.storage_base_url, config.storage_api_key)
        .expect("failed to build storage client");
    let notifier =
        HttpNotifier::new(config.notifier_base_url).expect("failed to build notifier client");

    let state = AppState {
        db,
        gateway,
        storage,
        notifier,
        jwt_secret: config.jwt_secret,
        webhook_secret,
        check_in_base_url: config.check_in_base_url,
        payment_notify_url: config.payment_notify_url,
    };

    let router = build_router(state);
    let http_addr = format!("0.0.0.0:{}", config.tickets_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("tickets service listening on {http_addr}");
    axum::serve(listener, router).await.expect("server error");
}
