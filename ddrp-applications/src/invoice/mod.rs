//! GST invoice composition
//!
//! A draft holds customer fields and line items; totals are recomputed
//! from the draft on every call. The backend recomputes the authoritative
//! figures when the invoice is created.

pub mod calculator;
pub mod draft;
pub mod editor;

pub use calculator::{format_amount, grand_total, line_total, InvoiceTotals, LineBreakdown};
pub use draft::{InvoiceDraft, LineUpdate};
pub use editor::InvoiceEditor;
