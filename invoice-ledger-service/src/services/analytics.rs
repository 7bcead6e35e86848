//! Read-side aggregation over invoice snapshots.
//!
//! Everything here is a pure function of the invoices passed in. Revenue
//! figures cover every invoice whatever its status; outstanding revenue is
//! whatever has not been paid. Sums saturate at `Decimal::MAX`.

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Invoice, InvoiceStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    pub status: InvoiceStatus,
    pub count: usize,
    /// Share of all invoices, 0-100, two decimal places.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub invoice_count: usize,
    pub total_revenue: Decimal,
    pub paid_revenue: Decimal,
    pub outstanding_revenue: Decimal,
    pub revenue_by_product: Vec<ProductRevenue>,
    pub status_distribution: Vec<StatusShare>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn total_revenue<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Decimal {
    saturating_sum(invoices.into_iter().map(Invoice::total_amount))
}

pub fn paid_revenue<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Decimal {
    saturating_sum(
        invoices
            .into_iter()
            .filter(|i| i.status() == InvoiceStatus::Paid)
            .map(Invoice::total_amount),
    )
}

/// Revenue per item name, highest first; ties ordered by name.
pub fn revenue_by_product<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
) -> Vec<ProductRevenue> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for invoice in invoices {
        for item in invoice.items() {
            let total = totals.entry(item.name.as_str()).or_default();
            *total = total.saturating_add(item.line_total());
        }
    }

    let mut products: Vec<ProductRevenue> = totals
        .into_iter()
        .map(|(product, revenue)| ProductRevenue {
            product: product.to_string(),
            revenue,
        })
        .collect();
    products.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product.cmp(&b.product))
    });
    products
}

/// Count and percentage for every status, in lifecycle order.
pub fn status_distribution<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Vec<StatusShare> {
    let mut counts: HashMap<InvoiceStatus, usize> = HashMap::new();
    let mut total = 0usize;
    for invoice in invoices {
        *counts.entry(invoice.status()).or_default() += 1;
        total += 1;
    }

    InvoiceStatus::ALL
        .iter()
        .map(|&status| {
            let count = counts.get(&status).copied().unwrap_or(0);
            let percentage = if total == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(count) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
            };
            StatusShare {
                status,
                count,
                percentage,
            }
        })
        .collect()
}

/// Revenue grouped by the month of the invoice date, oldest first.
pub fn monthly_revenue<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> Vec<MonthlyRevenue> {
    let mut months: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for invoice in invoices {
        let date = invoice.date();
        let revenue = months.entry((date.year(), date.month())).or_default();
        *revenue = revenue.saturating_add(invoice.total_amount());
    }

    months
        .into_iter()
        .map(|((year, month), revenue)| MonthlyRevenue {
            month: format!("{:04}-{:02}", year, month),
            revenue,
        })
        .collect()
}

/// Bundle every aggregate for one snapshot.
pub fn summarize<'a, I>(invoices: I) -> LedgerSummary
where
    I: IntoIterator<Item = &'a Invoice>,
    I::IntoIter: Clone,
{
    let invoices = invoices.into_iter();
    let total = total_revenue(invoices.clone());
    let paid = paid_revenue(invoices.clone());
    LedgerSummary {
        invoice_count: invoices.clone().count(),
        total_revenue: total,
        paid_revenue: paid,
        outstanding_revenue: total - paid,
        revenue_by_product: revenue_by_product(invoices.clone()),
        status_distribution: status_distribution(invoices.clone()),
        monthly_revenue: monthly_revenue(invoices),
    }
}
