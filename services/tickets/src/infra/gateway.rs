use std::time::Duration;

use anyhow::Context as _;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::config::GatewayConfig;
use crate::domain::repository::PaymentGatewayPort;
use crate::domain::types::{
    CreateOrderRequest, GatewayOrder, GatewaySession, PaymentAttempt, PaymentAttemptStatus,
};
use crate::error::TicketsServiceError;

/// Order-lookup retry bound. The lookup is a pure read keyed by order id,
/// so re-attempting after a transient failure cannot double-charge.
const FETCH_ORDER_ATTEMPTS: u32 = 3;
const FETCH_ORDER_BACKOFF: Duration = Duration::from_millis(200);

/// HTTP client for the external payment gateway.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build gateway HTTP client")?;
        Ok(Self { http, config })
    }

    fn orders_url(&self, suffix: &str) -> String {
        format!("{}/orders{suffix}", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch_order_once(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrder>, TicketsServiceError> {
        let response = self
            .http
            .get(self.orders_url(&format!("/{order_id}/payments")))
            .header("x-client-id", &self.config.client_id)
            .header("x-client-secret", &self.config.client_secret)
            .send()
            .await
            .map_err(classify_transport_error)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| anyhow::Error::new(e).context("gateway order lookup"))?;

        let payments: Vec<GatewayPaymentDto> = response
            .json()
            .await
            .map_err(|e| anyhow::Error::new(e).context("decode gateway payments"))?;

        Ok(Some(GatewayOrder {
            order_id: order_id.to_owned(),
            attempts: payments.into_iter().map(PaymentAttempt::from).collect(),
        }))
    }
}

impl PaymentGatewayPort for HttpPaymentGateway {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<GatewaySession, TicketsServiceError> {
        let body = serde_json::json!({
            "order_id": request.order_id,
            "order_amount": request.amount,
            "order_currency": request.currency,
            "customer_details": {
                "customer_id": request.customer_id,
                "customer_email": request.customer_email,
            },
            "order_meta": {
                "notify_url": request.notify_url,
            },
        });

        let response = self
            .http
            .post(self.orders_url(""))
            .header("x-client-id", &self.config.client_id)
            .header("x-client-secret", &self.config.client_secret)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?
            .error_for_status()
            .map_err(|e| anyhow::Error::new(e).context("gateway order creation"))?;

        let session: GatewaySessionDto = response
            .json()
            .await
            .map_err(|e| anyhow::Error::new(e).context("decode gateway session"))?;

        Ok(GatewaySession {
            order_id: session.order_id,
            payment_session_id: session.payment_session_id,
        })
    }

    async fn fetch_order(
        &self,
        order_id: &str,
    ) -> Result<Option<GatewayOrder>, TicketsServiceError> {
        let mut attempt = 0;
        loop {
            match self.fetch_order_once(order_id).await {
                Ok(order) => return Ok(order),
                Err(TicketsServiceError::GatewayUnavailable)
                    if attempt + 1 < FETCH_ORDER_ATTEMPTS =>
                {
                    attempt += 1;
                    tracing::warn!(order_id, attempt, "gateway order lookup retry");
                    tokio::time::sleep(FETCH_ORDER_BACKOFF * 2u32.pow(attempt - 1)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Timeouts and connection failures are a distinct failure kind — the
/// caller must not mistake a gateway outage for a missing payment.
fn classify_transport_error(err: reqwest::Error) -> TicketsServiceError {
    if err.is_timeout() || err.is_connect() {
        TicketsServiceError::GatewayUnavailable
    } else {
        anyhow::Error::new(err).context("gateway request").into()
    }
}

#[derive(Deserialize)]
struct GatewaySessionDto {
    order_id: String,
    payment_session_id: String,
}

#[derive(Deserialize)]
struct GatewayPaymentDto {
    cf_payment_id: i64,
    payment_status: String,
    /// Minor currency units.
    payment_amount: i64,
}

impl From<GatewayPaymentDto> for PaymentAttempt {
    fn from(dto: GatewayPaymentDto) -> Self {
        PaymentAttempt {
            gateway_payment_id: dto.cf_payment_id.to_string(),
            status: PaymentAttemptStatus::parse(&dto.payment_status),
            amount: dto.payment_amount,
        }
    }
}

// ── Webhook signatures ───────────────────────────────────────────────────────

type HmacSha256 = Hmac<Sha256>;

/// Compute the webhook signature for `{timestamp}.{body}`. The gateway
/// signs with the shared webhook secret; simulators and contract tests
/// use this to produce valid payloads.
pub fn sign_webhook_payload(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Verify a webhook signature in constant time. A payload that fails here
/// must never be parsed, let alone acted on.
pub fn verify_webhook_signature(
    secret: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> bool {
    let Ok(expected) = STANDARD.decode(signature) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
