//! Outbound client for the Wapangaji mobile-money gateway. Checkout pushes
//! an STK prompt to the buyer's phone; disbursement pays a seller out.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::payments_errors::{PaymentError, Result};
use super::payments_model::PaymentStatus;

/// What the gateway told us about a freshly submitted request.
#[derive(Debug, Clone)]
pub struct GatewayReceipt {
    pub external_id: Option<String>,
    pub status: PaymentStatus,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests money from a customer (buy side).
    async fn checkout(&self, phone: &str, amount: f64, reference: &str) -> Result<GatewayReceipt>;
    /// Sends money to a customer (sell side).
    async fn disburse(&self, phone: &str, amount: f64, reference: &str) -> Result<GatewayReceipt>;
}

/// Maps the provider's status vocabulary onto ours. Anything unrecognized
/// stays pending and is resolved by a later callback.
pub fn normalize_status(raw: &str) -> PaymentStatus {
    match raw.to_ascii_lowercase().as_str() {
        "success" | "successful" | "completed" | "paid" | "settled" => PaymentStatus::Completed,
        "failed" | "failure" | "cancelled" | "canceled" | "rejected" | "error" => {
            PaymentStatus::Failed
        }
        _ => PaymentStatus::Pending,
    }
}

#[derive(Serialize)]
struct WapangajiRequest<'a> {
    phone: &'a str,
    amount: f64,
    reference: &'a str,
}

#[derive(Deserialize)]
struct WapangajiResponse {
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct WapangajiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl WapangajiClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn submit(
        &self,
        path: &str,
        phone: &str,
        amount: f64,
        reference: &str,
    ) -> Result<GatewayReceipt> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        debug!("Submitting {} request for reference {}", path, reference);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&WapangajiRequest {
                phone,
                amount,
                reference,
            })
            .send()
            .await
            .map_err(|e| PaymentError::GatewayUnreachable(e.to_string()))?;

        let http_status = response.status();
        let body: WapangajiResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::GatewayUnreachable(e.to_string()))?;

        if !http_status.is_success() {
            let reason = body
                .message
                .unwrap_or_else(|| format!("HTTP {}", http_status));
            return Err(PaymentError::GatewayRejected(reason));
        }

        Ok(GatewayReceipt {
            external_id: body.transaction_id,
            status: body
                .status
                .as_deref()
                .map(normalize_status)
                .unwrap_or(PaymentStatus::Pending),
        })
    }
}

#[async_trait]
impl PaymentGateway for WapangajiClient {
    async fn checkout(&self, phone: &str, amount: f64, reference: &str) -> Result<GatewayReceipt> {
        self.submit("checkout", phone, amount, reference).await
    }

    async fn disburse(&self, phone: &str, amount: f64, reference: &str) -> Result<GatewayReceipt> {
        self.submit("disbursement", phone, amount, reference).await
    }
}
