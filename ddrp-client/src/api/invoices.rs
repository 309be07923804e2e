//! Invoice endpoints

use super::{segment, BackendClient};
use ddrp_core::{DdrpError, DdrpResult, ErrorContext, GstInvoiceRequest, Invoice, InvoiceStatus};
use log::info;
use reqwest::Method;
use serde_json::json;

impl BackendClient {
    /// `GET /invoices`
    pub async fn list_invoices(&self, token: &str) -> DdrpResult<Vec<Invoice>> {
        let builder = self.request(Method::GET, "invoices", Some(token));
        self.send_json(builder, "list_invoices").await
    }

    /// `POST /invoices/gst`: the backend computes the authoritative totals
    pub async fn create_gst_invoice(
        &self,
        token: &str,
        request: &GstInvoiceRequest,
    ) -> DdrpResult<Invoice> {
        let builder = self
            .request(Method::POST, "invoices/gst", Some(token))
            .json(request);
        let invoice: Invoice = self.send_json(builder, "create_gst_invoice").await?;
        info!(
            "Created invoice {} for {}",
            invoice.invoice_number, invoice.customer_name
        );
        Ok(invoice)
    }

    /// `GET /invoices/{id}/pdf`: raw PDF bytes
    pub async fn invoice_pdf(&self, token: &str, invoice_id: &str) -> DdrpResult<Vec<u8>> {
        let endpoint = format!("invoices/{}/pdf", segment(invoice_id));
        let builder = self.request(Method::GET, &endpoint, Some(token));
        let response = self.send(builder, "invoice_pdf").await?;

        let bytes = response.bytes().await.map_err(|e| DdrpError::Network {
            message: format!("Failed to read PDF body: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("backend_client").with_operation("invoice_pdf"),
        })?;
        Ok(bytes.to_vec())
    }

    /// `PUT /invoices/{id}/status`
    pub async fn update_invoice_status(
        &self,
        token: &str,
        invoice_id: &str,
        status: InvoiceStatus,
    ) -> DdrpResult<()> {
        let endpoint = format!("invoices/{}/status", segment(invoice_id));
        let builder = self
            .request(Method::PUT, &endpoint, Some(token))
            .json(&json!({ "status": status }));
        self.send(builder, "update_invoice_status").await?;
        Ok(())
    }

    /// `DELETE /invoices/{id}`
    pub async fn delete_invoice(&self, token: &str, invoice_id: &str) -> DdrpResult<()> {
        let endpoint = format!("invoices/{}", segment(invoice_id));
        let builder = self.request(Method::DELETE, &endpoint, Some(token));
        self.send(builder, "delete_invoice").await?;
        Ok(())
    }
}
