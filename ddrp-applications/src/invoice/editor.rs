//! Interactive invoice editing
//!
//! Wraps a draft so that rejected edits and submission outcomes reach the
//! user as notices instead of being returned to a view.

use super::draft::{InvoiceDraft, LineUpdate};
use crate::notice::NoticeBoard;
use crate::session::SessionManager;
use crate::{ApplicationError, ApplicationResult};
use ddrp_client::BackendClient;
use ddrp_core::{log_operation_error, log_operation_start, log_operation_success, Invoice};

pub const INVOICE_CREATED: &str = "Invoice created successfully!";
pub const INVOICE_CREATE_FAILED: &str = "Failed to create invoice";

#[derive(Debug, Clone)]
pub struct InvoiceEditor {
    draft: InvoiceDraft,
    notices: NoticeBoard,
}

impl InvoiceEditor {
    pub fn new(notices: NoticeBoard) -> Self {
        Self::with_draft(InvoiceDraft::new(), notices)
    }

    pub fn with_draft(draft: InvoiceDraft, notices: NoticeBoard) -> Self {
        Self { draft, notices }
    }

    pub fn draft(&self) -> &InvoiceDraft {
        &self.draft
    }

    /// Customer and dispatch fields are edited in place
    pub fn draft_mut(&mut self) -> &mut InvoiceDraft {
        &mut self.draft
    }

    pub fn add_line(&mut self) -> usize {
        self.draft.add_line()
    }

    /// Returns false, with a notice, when the line was kept
    pub fn remove_line(&mut self, index: usize) -> bool {
        match self.draft.remove_line(index) {
            Ok(_) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn update_line(&mut self, index: usize, update: LineUpdate) -> bool {
        match self.draft.update_line(index, update) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn set_discount_percent(&mut self, value: f64) {
        self.draft.set_discount_percent(value);
    }

    pub fn grand_total(&self) -> f64 {
        self.draft.grand_total()
    }

    fn report(&self, error: &ApplicationError) {
        self.notices.error(error.user_message(INVOICE_CREATE_FAILED));
    }

    /// Validate locally, then create the invoice
    ///
    /// On success the draft is reset. On failure it is left as it was.
    pub async fn submit(
        &mut self,
        session: &SessionManager,
        client: &BackendClient,
    ) -> ApplicationResult<Invoice> {
        if let Err(e) = self.draft.validate() {
            self.report(&e);
            return Err(e);
        }

        let token = match session.require_authenticated().await {
            Ok(token) => token,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };

        log_operation_start!("create_invoice", lines = self.draft.lines().len());
        let request = self.draft.to_request();
        match client.create_gst_invoice(&token, &request).await {
            Ok(invoice) => {
                log_operation_success!("create_invoice", invoice = %invoice.invoice_number);
                self.draft.reset();
                self.notices.success(INVOICE_CREATED);
                Ok(invoice)
            }
            Err(e) => {
                log_operation_error!("create_invoice", e);
                if !session.expire_on_auth_failure(&e).await {
                    self.notices.error(e.user_message(INVOICE_CREATE_FAILED));
                }
                Err(e.into())
            }
        }
    }
}
