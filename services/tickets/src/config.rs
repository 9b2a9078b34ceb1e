/// Payment gateway client configuration. Constructed once at startup and
/// injected into the gateway client — never a process-wide singleton.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway API base URL (e.g. "https://api.gateway.example").
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Secret for webhook signature verification.
    pub webhook_secret: String,
    /// Request timeout for every gateway call (default 10).
    pub timeout_secs: u64,
}

/// Tickets service configuration loaded from environment variables.
#[derive(Debug)]
pub struct TicketsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3114). Env var: `TICKETS_PORT`.
    pub tickets_port: u16,
    /// HMAC secret for validating bearer tokens.
    pub jwt_secret: String,
    pub gateway: GatewayConfig,
    /// Object storage base URL for QR artifact mirroring.
    pub storage_base_url: String,
    pub storage_api_key: String,
    /// Notifier service base URL (mail + analytics collaborator).
    pub notifier_base_url: String,
    /// Base URL embedded in QR check-in deep links.
    pub check_in_base_url: String,
    /// Publicly reachable webhook URL handed to the gateway on order
    /// creation. Env var: `PAYMENT_NOTIFY_URL` (optional).
    pub payment_notify_url: Option<String>,
}

impl TicketsConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            tickets_port: std::env::var("TICKETS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3114),
            jwt_secret: std::env::var("JWT_SECRET").expect("JWT_SECRET"),
            gateway: GatewayConfig {
                base_url: std::env::var("GATEWAY_BASE_URL").expect("GATEWAY_BASE_URL"),
                client_id: std::env::var("GATEWAY_CLIENT_ID").expect("GATEWAY_CLIENT_ID"),
                client_secret: std::env::var("GATEWAY_CLIENT_SECRET")
                    .expect("GATEWAY_CLIENT_SECRET"),
                webhook_secret: std::env::var("GATEWAY_WEBHOOK_SECRET")
                    .expect("GATEWAY_WEBHOOK_SECRET"),
                timeout_secs: std::env::var("GATEWAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
            storage_base_url: std::env::var("STORAGE_BASE_URL").expect("STORAGE_BASE_URL"),
            storage_api_key: std::env::var("STORAGE_API_KEY").expect("STORAGE_API_KEY"),
            notifier_base_url: std::env::var("NOTIFIER_BASE_URL").expect("NOTIFIER_BASE_URL"),
            check_in_base_url: std::env::var("CHECK_IN_BASE_URL").expect("CHECK_IN_BASE_URL"),
            payment_notify_url: std::env::var("PAYMENT_NOTIFY_URL").ok(),
        }
    }
}
