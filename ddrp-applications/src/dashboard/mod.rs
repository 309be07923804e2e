//! Dashboard operations over orders, raw materials and invoices
//!
//! Every action reports its outcome as a notice. A 401 from the backend
//! ends the session; any other failure leaves the cached lists as they were.

pub mod filter;

pub use filter::{filter_orders, StatusFilter};

use crate::invoice::{InvoiceDraft, InvoiceEditor};
use crate::notice::NoticeBoard;
use crate::session::SessionManager;
use crate::ApplicationResult;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ddrp_client::BackendClient;
use ddrp_core::logging::performance;
use ddrp_core::{
    log_operation_error, log_operation_start, log_operation_success, validation_error, DdrpError,
    DdrpResult, Invoice, InvoiceStatus, NewOrder, NewRawMaterial, Order, OrderStatus, RawMaterial,
};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Authenticated,
    Admin,
}

/// Cached list reloaded after a successful change
#[derive(Debug, Clone, Copy)]
enum Listing {
    Orders,
    RawMaterials,
    Invoices,
}

/// Dashboard state: the session handle plus the last fetched lists
pub struct Dashboard {
    session: Arc<SessionManager>,
    client: BackendClient,
    notices: NoticeBoard,
    orders: Vec<Order>,
    raw_materials: Vec<RawMaterial>,
    invoices: Vec<Invoice>,
}

impl Dashboard {
    pub fn new(session: Arc<SessionManager>, client: BackendClient) -> Self {
        let notices = session.notices().clone();
        Self {
            session,
            client,
            notices,
            orders: Vec::new(),
            raw_materials: Vec::new(),
            invoices: Vec::new(),
        }
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn raw_materials(&self) -> &[RawMaterial] {
        &self.raw_materials
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Cached orders narrowed by search text and status
    pub fn filtered_orders(&self, search: &str, filter: StatusFilter) -> Vec<&Order> {
        filter_orders(&self.orders, search, filter)
    }

    /// Run one backend call behind an access guard
    ///
    /// Failures become notices: the guard message, the session-invalid
    /// notice on a 401, otherwise whatever `failure` makes of the error.
    async fn call<T, F, Fut, M>(
        &self,
        access: Access,
        operation: &str,
        request: F,
        failure: M,
    ) -> ApplicationResult<T>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = DdrpResult<T>>,
        M: FnOnce(&DdrpError) -> String,
    {
        let guard = match access {
            Access::Admin => self.session.require_admin().await,
            Access::Authenticated => self.session.require_authenticated().await,
        };
        let token = match guard {
            Ok(token) => token,
            Err(e) => {
                self.notices.error(e.user_message(UNKNOWN_ERROR));
                return Err(e);
            }
        };

        log_operation_start!(operation);
        match request(token).await {
            Ok(value) => {
                log_operation_success!(operation);
                Ok(value)
            }
            Err(e) => {
                log_operation_error!(operation, e);
                if !self.session.expire_on_auth_failure(&e).await {
                    self.notices.error(failure(&e));
                }
                Err(e.into())
            }
        }
    }

    /// Publish a local validation failure without touching the network
    fn reject<T>(&self, error: DdrpError) -> ApplicationResult<T> {
        self.notices.error(error.user_message(UNKNOWN_ERROR));
        Err(error.into())
    }

    /// Reload a list; its own failure notice is enough
    async fn refresh_quietly(&mut self, listing: Listing) {
        let result = match listing {
            Listing::Orders => self.refresh_orders().await.map(|_| ()),
            Listing::RawMaterials => self.refresh_raw_materials().await.map(|_| ()),
            Listing::Invoices => self.refresh_invoices().await.map(|_| ()),
        };
        if let Err(e) = result {
            debug!("Reload of {:?} after update failed: {}", listing, e);
        }
    }

    /// Everything an admin sees on load
    pub async fn refresh_all(&mut self) -> ApplicationResult<()> {
        performance::measure_async("dashboard_refresh_all", async {
            self.refresh_orders().await?;
            if self.session.snapshot().await.is_admin() {
                self.refresh_raw_materials().await?;
                self.refresh_invoices().await?;
            }
            ApplicationResult::Ok(())
        })
        .await
    }

    /// All orders for an admin, the user's own orders otherwise
    pub async fn refresh_orders(&mut self) -> ApplicationResult<&[Order]> {
        let state = self.session.snapshot().await;
        let client = &self.client;

        let orders = if state.is_admin() {
            self.call(
                Access::Admin,
                "list_orders",
                move |token| async move { client.list_orders(&token).await },
                |_| "Failed to fetch orders. Please try again.".to_string(),
            )
            .await?
        } else {
            let Some(user_id) = state.user_id.filter(|id| !id.is_empty()) else {
                debug!("No user id in session; skipping order fetch");
                return Ok(&self.orders);
            };
            self.call(
                Access::Authenticated,
                "list_user_orders",
                move |token| async move { client.list_user_orders(&token, &user_id).await },
                |e| format!("Failed to fetch orders: {}", e.user_message(UNKNOWN_ERROR)),
            )
            .await?
        };

        self.orders = orders;
        Ok(&self.orders)
    }

    /// Place an order for the current user
    pub async fn place_order(&mut self, product: &str, quantity: u32) -> ApplicationResult<Order> {
        let product = product.trim();
        if product.is_empty() {
            return self.reject(validation_error!(
                "Please enter a product name",
                "product",
                "dashboard"
            ));
        }
        if quantity < 1 {
            return self.reject(validation_error!(
                "Quantity must be at least 1",
                "quantity",
                "dashboard"
            ));
        }

        let order = NewOrder {
            product: product.to_string(),
            quantity,
        };
        let client = &self.client;
        let created = self
            .call(
                Access::Authenticated,
                "create_order",
                move |token| async move { client.create_order(&token, &order).await },
                |e| format!("Error placing order: {}", e.user_message(UNKNOWN_ERROR)),
            )
            .await?;

        self.notices.success(format!(
            "Order placed successfully! Order ID: {}",
            created.id
        ));
        self.refresh_quietly(Listing::Orders).await;
        Ok(created)
    }

    pub async fn update_order_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
    ) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "update_order_status",
            move |token| async move { client.update_order_status(&token, order_id, status).await },
            |e| e.user_message("Failed to update status. Please try again."),
        )
        .await?;

        self.notices.success("Order status updated successfully!");
        self.refresh_quietly(Listing::Orders).await;
        Ok(())
    }

    pub async fn delete_order(&mut self, order_id: &str) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "delete_order",
            move |token| async move { client.delete_order(&token, order_id).await },
            |e| e.user_message("Failed to delete order. Please try again."),
        )
        .await?;

        self.notices.success("Order deleted successfully!");
        self.refresh_quietly(Listing::Orders).await;
        Ok(())
    }

    /// Set the expected delivery to UTC midnight of `date`
    pub async fn set_expected_delivery(
        &mut self,
        order_id: &str,
        date: NaiveDate,
    ) -> ApplicationResult<()> {
        let expected: DateTime<Utc> = date.and_time(NaiveTime::MIN).and_utc();
        let client = &self.client;
        self.call(
            Access::Admin,
            "update_expected_delivery",
            move |token| async move {
                client
                    .update_expected_delivery(&token, order_id, expected)
                    .await
            },
            |e| e.user_message("Failed to update expected delivery date. Please try again."),
        )
        .await?;

        self.notices.success("Expected delivery date updated!");
        self.refresh_quietly(Listing::Orders).await;
        Ok(())
    }

    pub async fn check_delays(&mut self) -> ApplicationResult<serde_json::Value> {
        let client = &self.client;
        let report = self
            .call(
                Access::Admin,
                "check_delays",
                move |token| async move { client.check_delays(&token).await },
                |e| e.user_message("Failed to check for delays. Please try again."),
            )
            .await?;

        self.notices.success("Delay check completed!");
        self.refresh_quietly(Listing::Orders).await;
        Ok(report)
    }

    pub async fn refresh_raw_materials(&mut self) -> ApplicationResult<&[RawMaterial]> {
        let client = &self.client;
        let materials = self
            .call(
                Access::Admin,
                "list_raw_materials",
                move |token| async move { client.list_raw_materials(&token).await },
                |_| "Failed to fetch raw materials. Please try again.".to_string(),
            )
            .await?;

        self.raw_materials = materials;
        Ok(&self.raw_materials)
    }

    /// Record a raw material batch against an order
    pub async fn add_raw_material(&mut self, material: NewRawMaterial) -> ApplicationResult<()> {
        let blank = [
            ("order_id", &material.order_id),
            ("batch_no", &material.batch_no),
            ("recipe_no", &material.recipe_no),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((field, _)) = blank {
            return self.reject(validation_error!(
                "Please fill in all required fields",
                field,
                "dashboard"
            ));
        }
        if !material.raw_material_quantity.is_finite() || material.raw_material_quantity <= 0.0 {
            return self.reject(validation_error!(
                "Quantity must be greater than zero",
                "raw_material_quantity",
                "dashboard"
            ));
        }

        let client = &self.client;
        self.call(
            Access::Admin,
            "create_raw_material",
            move |token| async move { client.create_raw_material(&token, &material).await },
            |e| e.user_message("Failed to add raw material inventory. Please try again."),
        )
        .await?;

        self.notices
            .success("Raw material inventory added successfully!");
        self.refresh_quietly(Listing::RawMaterials).await;
        Ok(())
    }

    pub async fn consume_raw_material(&mut self, material_id: &str) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "consume_raw_material",
            move |token| async move { client.consume_raw_material(&token, material_id).await },
            |e| e.user_message("Failed to mark as consumed. Please try again."),
        )
        .await?;

        self.notices.success("Raw material marked as consumed!");
        self.refresh_quietly(Listing::RawMaterials).await;
        Ok(())
    }

    pub async fn delete_raw_material(&mut self, material_id: &str) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "delete_raw_material",
            move |token| async move { client.delete_raw_material(&token, material_id).await },
            |e| e.user_message("Failed to delete raw material. Please try again."),
        )
        .await?;

        self.notices.success("Raw material deleted successfully!");
        self.refresh_quietly(Listing::RawMaterials).await;
        Ok(())
    }

    pub async fn check_natural_alerts(&mut self) -> ApplicationResult<serde_json::Value> {
        let client = &self.client;
        let report = self
            .call(
                Access::Admin,
                "check_natural_alerts",
                move |token| async move { client.check_natural_alerts(&token).await },
                |e| e.user_message("Failed to check natural rubber alerts. Please try again."),
            )
            .await?;

        self.notices.success("Natural rubber alerts checked!");
        Ok(report)
    }

    pub async fn refresh_invoices(&mut self) -> ApplicationResult<&[Invoice]> {
        let client = &self.client;
        let invoices = self
            .call(
                Access::Admin,
                "list_invoices",
                move |token| async move { client.list_invoices(&token).await },
                |_| "Failed to fetch invoices. Please try again.".to_string(),
            )
            .await?;

        self.invoices = invoices;
        Ok(&self.invoices)
    }

    pub async fn update_invoice_status(
        &mut self,
        invoice_id: &str,
        status: InvoiceStatus,
    ) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "update_invoice_status",
            move |token| async move {
                client
                    .update_invoice_status(&token, invoice_id, status)
                    .await
            },
            |e| e.user_message("Failed to update invoice status. Please try again."),
        )
        .await?;

        self.notices.success("Invoice status updated successfully!");
        self.refresh_quietly(Listing::Invoices).await;
        Ok(())
    }

    pub async fn delete_invoice(&mut self, invoice_id: &str) -> ApplicationResult<()> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "delete_invoice",
            move |token| async move { client.delete_invoice(&token, invoice_id).await },
            |e| e.user_message("Failed to delete invoice. Please try again."),
        )
        .await?;

        self.notices.success("Invoice deleted successfully!");
        self.refresh_quietly(Listing::Invoices).await;
        Ok(())
    }

    /// PDF bytes of an invoice
    pub async fn download_invoice_pdf(&self, invoice_id: &str) -> ApplicationResult<Vec<u8>> {
        let client = &self.client;
        self.call(
            Access::Admin,
            "invoice_pdf",
            move |token| async move { client.invoice_pdf(&token, invoice_id).await },
            |e| e.user_message("Failed to download PDF. Please try again."),
        )
        .await
    }

    /// Editor for a new invoice, optionally linked to an order
    pub fn new_invoice(&self, order_id: Option<&str>) -> InvoiceEditor {
        let draft = match order_id {
            Some(order_id) => InvoiceDraft::for_order(order_id),
            None => InvoiceDraft::new(),
        };
        InvoiceEditor::with_draft(draft, self.notices.clone())
    }

    /// Submit an editor's draft and reload the invoice list
    pub async fn submit_invoice(&mut self, editor: &mut InvoiceEditor) -> ApplicationResult<Invoice> {
        let invoice = editor.submit(&self.session, &self.client).await?;
        self.refresh_quietly(Listing::Invoices).await;
        Ok(invoice)
    }
}
