//! Outbound invoice email over the Resend HTTP API.

use crate::config::BillingConfig;
use crate::errors::ServiceError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::counter;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, instrument};

/// A rendered invoice ready to be mailed.
#[derive(Debug, Clone)]
pub struct InvoiceEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment_filename: String,
    pub attachment_content_type: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait InvoiceMailer: Send + Sync {
    async fn send_invoice(&self, email: InvoiceEmail) -> Result<(), ServiceError>;
}

#[derive(Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

#[derive(Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    attachments: [ResendAttachment<'a>; 1],
}

#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    from: String,
}

impl ResendMailer {
    pub fn new(
        api_key: String,
        base_url: String,
        from: String,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            from,
        })
    }

    /// Builds a mailer when both the API key and sender are configured.
    pub fn from_config(config: &BillingConfig) -> Result<Option<Self>, ServiceError> {
        match (&config.resend_api_key, &config.billing_from_email) {
            (Some(key), Some(from)) if !key.trim().is_empty() && !from.trim().is_empty() => {
                Self::new(
                    key.clone(),
                    config.resend_base_url.clone(),
                    from.clone(),
                    Duration::from_secs(config.mailer_timeout_secs),
                )
                .map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl InvoiceMailer for ResendMailer {
    #[instrument(skip(self, email), fields(to = %email.to, subject = %email.subject))]
    async fn send_invoice(&self, email: InvoiceEmail) -> Result<(), ServiceError> {
        let payload = ResendEmail {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            attachments: [ResendAttachment {
                filename: &email.attachment_filename,
                content: STANDARD.encode(&email.attachment),
                content_type: &email.attachment_content_type,
            }],
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Invoice email request failed");
                counter!("mto_mailer.failures", 1);
                ServiceError::EmailDelivery("Resend failed to send the invoice email".into())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Resend rejected invoice email");
            counter!("mto_mailer.failures", 1);
            return Err(ServiceError::EmailDelivery(format!(
                "Resend rejected the invoice email ({})",
                status
            )));
        }

        counter!("mto_mailer.sent", 1);
        info!("Invoice email accepted by Resend");
        Ok(())
    }
}
