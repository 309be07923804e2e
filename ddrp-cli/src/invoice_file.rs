//! Invoice drafts described in a JSON file
//!
//! Every field goes through the same edits an interactive form would make,
//! so out-of-range numbers are clamped exactly as they are there.

use ddrp_applications::{InvoiceEditor, LineUpdate, NoticeBoard};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceFile {
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
    pub discount_percent: f64,
    pub line_items: Vec<LineInput>,
}

/// Numbers are taken as raw input and clamped on entry
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LineInput {
    pub hsn_code: String,
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub cgst_percent: f64,
    pub sgst_percent: f64,
    pub igst_percent: f64,
}

impl Default for LineInput {
    fn default() -> Self {
        Self {
            hsn_code: String::new(),
            description: String::new(),
            quantity: 1.0,
            rate: 0.0,
            cgst_percent: 0.0,
            sgst_percent: 0.0,
            igst_percent: 0.0,
        }
    }
}

impl LineInput {
    fn updates(&self) -> [LineUpdate; 7] {
        [
            LineUpdate::HsnCode(self.hsn_code.clone()),
            LineUpdate::Description(self.description.clone()),
            LineUpdate::Quantity(self.quantity),
            LineUpdate::Rate(self.rate),
            LineUpdate::CgstPercent(self.cgst_percent),
            LineUpdate::SgstPercent(self.sgst_percent),
            LineUpdate::IgstPercent(self.igst_percent),
        ]
    }
}

impl InvoiceFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replay the file into an editor that reports to `notices`
    pub fn into_editor(self, notices: NoticeBoard) -> InvoiceEditor {
        let mut editor = InvoiceEditor::new(notices);

        let draft = editor.draft_mut();
        draft.order_id = self.order_id;
        draft.customer_name = self.customer_name;
        draft.customer_email = self.customer_email;
        draft.customer_gstin = self.customer_gstin;
        draft.customer_address = self.customer_address;
        draft.delivery_note_no = self.delivery_note_no;
        draft.buyer_order_no = self.buyer_order_no;
        draft.dispatch_through = self.dispatch_through;
        draft.dispatch_doc_no = self.dispatch_doc_no;
        draft.notes = self.notes;

        for (position, line) in self.line_items.iter().enumerate() {
            // A new draft already holds one blank line
            let index = if position == 0 { 0 } else { editor.add_line() };
            for update in line.updates() {
                editor.update_line(index, update);
            }
        }
        editor.set_discount_percent(self.discount_percent);
        editor
    }
}
