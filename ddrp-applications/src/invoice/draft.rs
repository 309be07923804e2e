//! Invoice draft and line edits

use super::calculator::{grand_total, InvoiceTotals};
use crate::{ApplicationError, ApplicationResult};
use ddrp_core::{validation_error, GstInvoiceRequest, LineItem};
use serde::{Deserialize, Serialize};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";

/// One field edit on a line item
#[derive(Debug, Clone, PartialEq)]
pub enum LineUpdate {
    HsnCode(String),
    Description(String),
    /// Raw input; clamped to a whole number of at least 1
    Quantity(f64),
    /// Raw input; clamped to at least 0
    Rate(f64),
    CgstPercent(f64),
    SgstPercent(f64),
    IgstPercent(f64),
}

impl LineUpdate {
    fn apply(self, item: &LineItem) -> LineItem {
        let mut next = item.clone();
        match self {
            LineUpdate::HsnCode(value) => next.hsn_code = value,
            LineUpdate::Description(value) => next.description = value,
            LineUpdate::Quantity(value) => next.quantity = sanitize_quantity(value),
            LineUpdate::Rate(value) => next.rate = sanitize_rate(value),
            LineUpdate::CgstPercent(value) => next.cgst_percent = sanitize_percent(value),
            LineUpdate::SgstPercent(value) => next.sgst_percent = sanitize_percent(value),
            LineUpdate::IgstPercent(value) => next.igst_percent = sanitize_percent(value),
        }
        next
    }
}

/// NaN, infinite or below 1 becomes 1; otherwise truncated
pub fn sanitize_quantity(value: f64) -> u32 {
    if !value.is_finite() || value < 1.0 {
        1
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value.trunc() as u32
    }
}

/// NaN or negative becomes 0
pub fn sanitize_rate(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Clamped to `[0, 100]`; NaN becomes 0
pub fn sanitize_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Invoice being composed; always holds at least one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub order_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_gstin: String,
    pub customer_address: String,
    pub delivery_note_no: String,
    pub buyer_order_no: String,
    pub dispatch_through: String,
    pub dispatch_doc_no: String,
    pub notes: String,
    lines: Vec<LineItem>,
    discount_percent: f64,
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self {
            order_id: None,
            customer_name: String::new(),
            customer_email: String::new(),
            customer_gstin: String::new(),
            customer_address: String::new(),
            delivery_note_no: String::new(),
            buyer_order_no: String::new(),
            dispatch_through: String::new(),
            dispatch_doc_no: String::new(),
            notes: String::new(),
            lines: vec![LineItem::default()],
            discount_percent: 0.0,
        }
    }
}

impl InvoiceDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft linked to an existing order
    pub fn for_order(order_id: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn discount_percent(&self) -> f64 {
        self.discount_percent
    }

    pub fn set_discount_percent(&mut self, value: f64) {
        self.discount_percent = sanitize_percent(value);
    }

    /// Append a blank line: quantity 1, everything else zero or empty
    pub fn add_line(&mut self) -> usize {
        self.lines.push(LineItem::default());
        self.lines.len() - 1
    }

    /// Remove the line at `index`; the last remaining line cannot be removed
    pub fn remove_line(&mut self, index: usize) -> ApplicationResult<LineItem> {
        self.check_index(index)?;
        if self.lines.len() <= 1 {
            return Err(ApplicationError::MinimumOneLine);
        }
        Ok(self.lines.remove(index))
    }

    /// Replace the line at `index` with an edited copy
    pub fn update_line(&mut self, index: usize, update: LineUpdate) -> ApplicationResult<()> {
        self.check_index(index)?;
        self.lines[index] = update.apply(&self.lines[index]);
        Ok(())
    }

    fn check_index(&self, index: usize) -> ApplicationResult<()> {
        if index >= self.lines.len() {
            return Err(validation_error!(
                format!("No line item at position {}", index + 1),
                "line_items",
                "invoice_draft"
            )
            .into());
        }
        Ok(())
    }

    pub fn grand_total(&self) -> f64 {
        grand_total(&self.lines, self.discount_percent)
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::compute(&self.lines, self.discount_percent)
    }

    /// Required fields: customer name, customer email, one line
    pub fn validate(&self) -> ApplicationResult<()> {
        let missing = if self.customer_name.trim().is_empty() {
            Some("customer_name")
        } else if self.customer_email.trim().is_empty() {
            Some("customer_email")
        } else if self.lines.is_empty() {
            Some("line_items")
        } else {
            None
        };

        match missing {
            Some(field) => {
                Err(validation_error!(REQUIRED_FIELDS_MESSAGE, field, "invoice_draft").into())
            }
            None => Ok(()),
        }
    }

    /// Request body; blank optional fields are sent as null
    pub fn to_request(&self) -> GstInvoiceRequest {
        GstInvoiceRequest {
            order_id: self.order_id.clone().and_then(non_blank),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_gstin: non_blank(self.customer_gstin.clone()),
            customer_address: non_blank(self.customer_address.clone()),
            delivery_note_no: non_blank(self.delivery_note_no.clone()),
            buyer_order_no: non_blank(self.buyer_order_no.clone()),
            dispatch_through: non_blank(self.dispatch_through.clone()),
            dispatch_doc_no: non_blank(self.dispatch_doc_no.clone()),
            line_items: self.lines.clone(),
            discount_percent: self.discount_percent,
            notes: non_blank(self.notes.clone()),
        }
    }

    /// Back to a blank draft, keeping the linked order
    pub fn reset(&mut self) {
        *self = Self {
            order_id: self.order_id.take(),
            ..Self::default()
        };
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
