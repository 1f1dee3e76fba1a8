//! Invoice arithmetic and collection totals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Patent;

/// Tax rates in percent. GST and TDS are both levied on professional fees only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxRates {
    pub gst_percent: f64,
    pub tds_percent: f64,
}

impl Default for TaxRates {
    fn default() -> Self {
        Self {
            gst_percent: 18.0,
            tds_percent: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Invoice {
    pub professional_fees: f64,
    pub reimbursement: f64,
    pub gst: f64,
    pub tds: f64,
    /// Fees plus GST plus reimbursement.
    pub gross: f64,
    /// What the client actually pays after withholding TDS.
    pub net_receivable: f64,
}

impl Invoice {
    pub fn compute(professional_fees: f64, reimbursement: f64, rates: TaxRates) -> Self {
        let gst = round2(professional_fees * rates.gst_percent / 100.0);
        let tds = round2(professional_fees * rates.tds_percent / 100.0);
        let gross = round2(professional_fees + gst + reimbursement);
        Self {
            professional_fees,
            reimbursement,
            gst,
            tds,
            gross,
            net_receivable: round2(gross - tds),
        }
    }

    pub fn for_patent(patent: &Patent, rates: TaxRates) -> Self {
        Self::compute(patent.professional_fees, patent.reimbursement, rates)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub patents: usize,
    pub billed: f64,
    pub received: f64,
    /// Billed minus received, never below zero.
    pub outstanding: f64,
    pub invoices_sent: usize,
    /// Keyed by payment status name; `none` for rows without a status.
    pub by_status: BTreeMap<&'static str, usize>,
    /// Received over billed, in percent. 0 when nothing was billed.
    pub collection_rate: f64,
}

pub fn financial_summary(patents: &[Patent]) -> FinancialSummary {
    let mut summary = FinancialSummary {
        patents: patents.len(),
        ..Default::default()
    };
    for patent in patents {
        summary.billed += patent.payment_amount;
        summary.received += patent.payment_received;
        if patent.invoice_sent {
            summary.invoices_sent += 1;
        }
        let status = patent.payment_status.map_or("none", |s| s.as_str());
        *summary.by_status.entry(status).or_default() += 1;
    }

    summary.billed = round2(summary.billed);
    summary.received = round2(summary.received);
    summary.outstanding = round2((summary.billed - summary.received).max(0.0));
    summary.collection_rate = if summary.billed > 0.0 {
        round2(summary.received / summary.billed * 100.0)
    } else {
        0.0
    };
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentStatus;

    #[test]
    fn invoice_with_default_rates() {
        let invoice = Invoice::compute(50_000.0, 1_600.0, TaxRates::default());
        assert_eq!(invoice.gst, 9_000.0);
        assert_eq!(invoice.tds, 5_000.0);
        assert_eq!(invoice.gross, 60_600.0);
        assert_eq!(invoice.net_receivable, 55_600.0);
    }

    #[test]
    fn invoice_rounds_to_paise() {
        let rates = TaxRates {
            gst_percent: 18.0,
            tds_percent: 2.0,
        };
        let invoice = Invoice::compute(333.33, 0.0, rates);
        assert_eq!(invoice.gst, 60.0);
        assert_eq!(invoice.tds, 6.67);
        assert_eq!(invoice.gross, 393.33);
        assert_eq!(invoice.net_receivable, 386.66);
    }

    #[test]
    fn summary_totals_and_rate() {
        let patents = vec![
            Patent {
                payment_amount: 10_000.0,
                payment_received: 10_000.0,
                payment_status: Some(PaymentStatus::Received),
                invoice_sent: true,
                ..Default::default()
            },
            Patent {
                payment_amount: 10_000.0,
                payment_received: 2_500.0,
                payment_status: Some(PaymentStatus::Partial),
                invoice_sent: true,
                ..Default::default()
            },
            Patent::default(),
        ];
        let summary = financial_summary(&patents);
        assert_eq!(summary.billed, 20_000.0);
        assert_eq!(summary.received, 12_500.0);
        assert_eq!(summary.outstanding, 7_500.0);
        assert_eq!(summary.invoices_sent, 2);
        assert_eq!(summary.collection_rate, 62.5);
        assert_eq!(summary.by_status["received"], 1);
        assert_eq!(summary.by_status["partial"], 1);
        assert_eq!(summary.by_status["none"], 1);
    }

    #[test]
    fn nothing_billed_means_zero_rate() {
        let summary = financial_summary(&[Patent {
            payment_received: 500.0,
            ..Default::default()
        }]);
        assert_eq!(summary.collection_rate, 0.0);
        assert_eq!(summary.outstanding, 0.0);
        assert!(summary.collection_rate.is_finite());
    }

    #[test]
    fn empty_collection() {
        let summary = financial_summary(&[]);
        assert_eq!(summary.patents, 0);
        assert_eq!(summary.collection_rate, 0.0);
    }
}
