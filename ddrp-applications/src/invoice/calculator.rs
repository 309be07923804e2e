//! Line and grand totals

use ddrp_core::LineItem;
use serde::{Deserialize, Serialize};

/// `quantity * rate * (1 + (cgst + sgst + igst) / 100)`
pub fn line_total(item: &LineItem) -> f64 {
    let amount = f64::from(item.quantity) * item.rate;
    let tax_percent = item.cgst_percent + item.sgst_percent + item.igst_percent;
    amount + amount * (tax_percent / 100.0)
}

/// Sum of line totals less the discount
pub fn grand_total(lines: &[LineItem], discount_percent: f64) -> f64 {
    let gross: f64 = lines.iter().map(line_total).sum();
    gross * (1.0 - discount_percent / 100.0)
}

/// Two decimal places, as shown in previews
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

/// Per-line preview figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineBreakdown {
    pub amount: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub total_with_tax: f64,
}

impl LineBreakdown {
    pub fn of(item: &LineItem) -> Self {
        let amount = f64::from(item.quantity) * item.rate;
        Self {
            amount,
            cgst_amount: amount * item.cgst_percent / 100.0,
            sgst_amount: amount * item.sgst_percent / 100.0,
            igst_amount: amount * item.igst_percent / 100.0,
            total_with_tax: line_total(item),
        }
    }
}

/// Invoice-level preview figures
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub total_cgst: f64,
    pub total_sgst: f64,
    pub total_igst: f64,
    pub total_tax: f64,
    /// Sum of line totals before discount
    pub gross_total: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

impl InvoiceTotals {
    pub fn compute(lines: &[LineItem], discount_percent: f64) -> Self {
        let breakdowns: Vec<LineBreakdown> = lines.iter().map(LineBreakdown::of).collect();

        let subtotal: f64 = breakdowns.iter().map(|b| b.amount).sum();
        let total_cgst: f64 = breakdowns.iter().map(|b| b.cgst_amount).sum();
        let total_sgst: f64 = breakdowns.iter().map(|b| b.sgst_amount).sum();
        let total_igst: f64 = breakdowns.iter().map(|b| b.igst_amount).sum();
        let gross_total: f64 = breakdowns.iter().map(|b| b.total_with_tax).sum();
        let final_amount = grand_total(lines, discount_percent);

        Self {
            subtotal,
            total_cgst,
            total_sgst,
            total_igst,
            total_tax: total_cgst + total_sgst + total_igst,
            gross_total,
            discount_amount: gross_total - final_amount,
            final_amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, rate: f64, cgst: f64, sgst: f64, igst: f64) -> LineItem {
        LineItem {
            quantity,
            rate,
            cgst_percent: cgst,
            sgst_percent: sgst,
            igst_percent: igst,
            ..Default::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_line_total() {
        assert!(close(line_total(&item(2, 100.0, 9.0, 9.0, 0.0)), 236.0));
        assert!(close(line_total(&item(3, 50.0, 0.0, 0.0, 0.0)), 150.0));
        assert!(close(line_total(&LineItem::default()), 0.0));
    }

    #[test]
    fn test_grand_total_with_discount() {
        let lines = vec![item(2, 100.0, 9.0, 9.0, 0.0)];
        assert!(close(grand_total(&lines, 10.0), 212.4));
        assert!(close(grand_total(&lines, 0.0), 236.0));
        assert!(close(grand_total(&lines, 100.0), 0.0));
        assert!(close(grand_total(&[], 10.0), 0.0));
    }

    #[test]
    fn test_totals_preview() {
        let lines = vec![item(2, 100.0, 9.0, 9.0, 0.0), item(1, 50.0, 0.0, 0.0, 18.0)];
        let totals = InvoiceTotals::compute(&lines, 10.0);

        assert!(close(totals.subtotal, 250.0));
        assert!(close(totals.total_cgst, 18.0));
        assert!(close(totals.total_igst, 9.0));
        assert!(close(totals.total_tax, 45.0));
        assert!(close(totals.gross_total, 295.0));
        assert!(close(totals.final_amount, 265.5));
        assert!(close(totals.discount_amount, 29.5));
        assert_eq!(format_amount(totals.final_amount), "265.50");
    }

    #[test]
    fn test_breakdown_matches_line_total() {
        let line = item(4, 12.5, 6.0, 6.0, 0.0);
        let breakdown = LineBreakdown::of(&line);
        assert!(close(breakdown.amount, 50.0));
        assert!(close(breakdown.cgst_amount, 3.0));
        assert!(close(breakdown.total_with_tax, line_total(&line)));
    }
}
