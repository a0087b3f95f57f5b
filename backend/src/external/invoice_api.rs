//! REST invoice API client
//!
//! Mirrors purchases into a hosted invoice table exposed through a
//! PostgREST-style API (`/invoices`, `/invoice_items`).

use std::time::Duration;

use axum::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use shared::models::{InvoiceLineRecord, MirroredInvoice};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::invoice_mirror::InvoiceMirror;

/// REST invoice API client
#[derive(Clone)]
pub struct InvoiceApiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// Invoice id as returned by inserts and lookups
#[derive(Debug, Deserialize)]
struct InvoiceRef {
    id: Uuid,
}

/// Invoice line plus the foreign key the API expects
#[derive(Debug, Serialize)]
struct InvoiceLinePayload<'a> {
    invoice_id: Uuid,
    #[serde(flatten)]
    line: &'a InvoiceLineRecord,
}

impl InvoiceApiClient {
    /// Create a new InvoiceApiClient
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Invoice API client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: Response, what: &str) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AppError::Mirror(format!("{} failed: {} - {}", what, status, body)))
    }

    /// Insert the invoice header, `None` when it already exists
    async fn insert_header(&self, mirrored: &MirroredInvoice) -> AppResult<Option<Uuid>> {
        let url = format!("{}/invoices?on_conflict=source_purchase_id", self.base_url);

        let response = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation,resolution=ignore-duplicates")
            .json(&mirrored.invoice)
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("Invoice API request failed: {}", e)))?;

        let inserted: Vec<InvoiceRef> = Self::check(response, "Invoice insert")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Mirror(format!("Failed to parse invoice response: {}", e)))?;

        Ok(inserted.into_iter().next().map(|row| row.id))
    }

    async fn existing_invoice_id(&self, source_purchase_id: i64) -> AppResult<Uuid> {
        let url = format!(
            "{}/invoices?source_purchase_id=eq.{}&select=id",
            self.base_url, source_purchase_id
        );

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("Invoice API request failed: {}", e)))?;

        let found: Vec<InvoiceRef> = Self::check(response, "Invoice lookup")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Mirror(format!("Failed to parse invoice response: {}", e)))?;

        found.into_iter().next().map(|row| row.id).ok_or_else(|| {
            AppError::Mirror(format!(
                "Invoice for purchase {} disappeared during mirroring",
                source_purchase_id
            ))
        })
    }

    async fn has_lines(&self, invoice_id: Uuid) -> AppResult<bool> {
        let url = format!(
            "{}/invoice_items?invoice_id=eq.{}&select=invoice_id&limit=1",
            self.base_url, invoice_id
        );

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("Invoice API request failed: {}", e)))?;

        let rows: Vec<serde_json::Value> = Self::check(response, "Invoice line lookup")
            .await?
            .json()
            .await
            .map_err(|e| AppError::Mirror(format!("Failed to parse invoice line response: {}", e)))?;

        Ok(!rows.is_empty())
    }

    async fn insert_lines(&self, invoice_id: Uuid, mirrored: &MirroredInvoice) -> AppResult<()> {
        let lines: Vec<InvoiceLinePayload<'_>> = mirrored
            .lines
            .iter()
            .map(|line| InvoiceLinePayload { invoice_id, line })
            .collect();

        let response = self
            .authorize(self.client.post(format!("{}/invoice_items", self.base_url)))
            .json(&lines)
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("Invoice API request failed: {}", e)))?;

        Self::check(response, "Invoice line insert").await?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceMirror for InvoiceApiClient {
    fn backend_tag(&self) -> &'static str {
        "rest"
    }

    async fn mirror(&self, mirrored: &MirroredInvoice) -> AppResult<()> {
        let source_purchase_id = mirrored.invoice.source_purchase_id;

        let invoice_id = match self.insert_header(mirrored).await? {
            Some(id) => id,
            // Header exists from an earlier attempt; only its lines may be missing
            None => {
                let id = self.existing_invoice_id(source_purchase_id).await?;
                if self.has_lines(id).await? {
                    return Ok(());
                }
                id
            }
        };

        if mirrored.lines.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.insert_lines(invoice_id, mirrored).await {
            if let Err(cleanup) = self.remove(source_purchase_id).await {
                tracing::warn!(
                    purchase_id = source_purchase_id,
                    error = %cleanup,
                    "Could not roll back invoice header after line insert failed"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, source_purchase_id: i64) -> AppResult<()> {
        let url = format!(
            "{}/invoices?source_purchase_id=eq.{}",
            self.base_url, source_purchase_id
        );

        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| AppError::Mirror(format!("Invoice API request failed: {}", e)))?;

        Self::check(response, "Invoice delete").await?;
        Ok(())
    }
}
