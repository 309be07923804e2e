//! Invoice draft arithmetic and editing rules

use ddrp_applications::{
    grand_total, line_total, InvoiceDraft, InvoiceEditor, LineUpdate, NoticeBoard,
};
use ddrp_core::LineItem;

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn gasket_draft() -> InvoiceDraft {
    let mut draft = InvoiceDraft::new();
    draft.customer_name = "Acme Seals".to_string();
    draft.customer_email = "accounts@acme.test".to_string();
    draft
        .update_line(0, LineUpdate::Description("Gasket".to_string()))
        .unwrap();
    draft.update_line(0, LineUpdate::Quantity(2.0)).unwrap();
    draft.update_line(0, LineUpdate::Rate(100.0)).unwrap();
    draft.update_line(0, LineUpdate::CgstPercent(9.0)).unwrap();
    draft.update_line(0, LineUpdate::SgstPercent(9.0)).unwrap();
    draft
}

#[test]
fn test_worked_example() {
    let mut draft = gasket_draft();
    approx(line_total(&draft.lines()[0]), 236.0);

    draft.set_discount_percent(10.0);
    approx(draft.grand_total(), 212.4);

    let totals = draft.totals();
    approx(totals.subtotal, 200.0);
    approx(totals.total_tax, 36.0);
    approx(totals.discount_amount, 23.6);
    approx(totals.final_amount, 212.4);
}

#[test]
fn test_discount_bounds() {
    let mut draft = gasket_draft();
    draft.add_line();
    draft.update_line(1, LineUpdate::Quantity(3.0)).unwrap();
    draft.update_line(1, LineUpdate::Rate(40.0)).unwrap();
    draft.update_line(1, LineUpdate::IgstPercent(18.0)).unwrap();

    let sum: f64 = draft.lines().iter().map(line_total).sum();

    draft.set_discount_percent(0.0);
    approx(draft.grand_total(), sum);

    draft.set_discount_percent(100.0);
    approx(draft.grand_total(), 0.0);

    // Out-of-range discounts are clamped, never negative totals
    draft.set_discount_percent(140.0);
    approx(draft.grand_total(), 0.0);
    draft.set_discount_percent(-20.0);
    approx(draft.grand_total(), sum);
}

#[test]
fn test_line_total_grows_with_each_tax() {
    let base = LineItem {
        quantity: 5,
        rate: 80.0,
        ..Default::default()
    };
    let updates: [fn(&mut LineItem, f64); 3] = [
        |item, v| item.cgst_percent = v,
        |item, v| item.sgst_percent = v,
        |item, v| item.igst_percent = v,
    ];

    for set in updates {
        let mut previous = line_total(&base);
        for percent in [2.5, 6.0, 9.0, 14.0, 28.0] {
            let mut item = base.clone();
            set(&mut item, percent);
            let total = line_total(&item);
            assert!(total > previous);
            previous = total;
        }
    }
}

#[test]
fn test_added_line_defaults() {
    let mut draft = InvoiceDraft::new();
    let index = draft.add_line();

    assert_eq!(index, 1);
    let line = &draft.lines()[index];
    assert_eq!(line.quantity, 1);
    assert_eq!(line.rate, 0.0);
    assert_eq!(line.cgst_percent, 0.0);
    assert_eq!(line.sgst_percent, 0.0);
    assert_eq!(line.igst_percent, 0.0);
    assert!(line.hsn_code.is_empty());
    assert!(line.description.is_empty());
}

#[test]
fn test_removing_only_line_keeps_draft_and_notifies() {
    let notices = NoticeBoard::default();
    let mut receiver = notices.subscribe();
    let mut editor = InvoiceEditor::with_draft(gasket_draft(), notices);
    let before = editor.draft().clone();

    assert!(!editor.remove_line(0));

    assert_eq!(editor.draft(), &before);
    let notice = receiver.try_recv().unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.message, "At least one line item is required");
}

#[test]
fn test_garbage_numeric_input_is_clamped() {
    let mut draft = InvoiceDraft::new();
    draft.update_line(0, LineUpdate::Quantity(f64::NAN)).unwrap();
    draft.update_line(0, LineUpdate::Rate(-50.0)).unwrap();
    draft.update_line(0, LineUpdate::CgstPercent(f64::NAN)).unwrap();
    draft.update_line(0, LineUpdate::IgstPercent(400.0)).unwrap();

    let line = &draft.lines()[0];
    assert_eq!(line.quantity, 1);
    assert_eq!(line.rate, 0.0);
    assert_eq!(line.cgst_percent, 0.0);
    assert_eq!(line.igst_percent, 100.0);
    assert!(draft.grand_total().is_finite());
}

#[test]
fn test_grand_total_of_free_function_matches_draft() {
    let mut draft = gasket_draft();
    draft.set_discount_percent(5.0);
    approx(
        grand_total(draft.lines(), draft.discount_percent()),
        draft.grand_total(),
    );
}
