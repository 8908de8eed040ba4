use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use super::money::serialize_amount;

/// Which partners a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    All,
    Partner(String),
}

/// Parameters for one report run.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub company: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub scope: ReportScope,
    pub currency_symbol: String,
    pub generated_at: NaiveDateTime,
}

impl ReportRequest {
    pub fn new(company: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            company: company.into(),
            start,
            end,
            scope: ReportScope::All,
            currency_symbol: "₹".to_string(),
            generated_at: Local::now().naive_local(),
        }
    }

    pub fn with_scope(mut self, scope: ReportScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.generated_at = at;
        self
    }
}

/// A single trip row in a partner table
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub vehicle_number: String,
    pub driver_name: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub incentive: Decimal,
}

/// One partner block: its trips, subtotals and the payable balance
#[derive(Debug, Clone, Serialize)]
pub struct PartnerSection {
    pub name: String,
    pub rows: Vec<ReportRow>,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub incentive: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub commission: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub payable: Decimal,
    pub remarks: Option<String>,
}

/// Grand totals across every partner in the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    #[serde(serialize_with = "serialize_amount")]
    pub amount: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub incentive: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub commission: Decimal,
    #[serde(serialize_with = "serialize_amount")]
    pub payable: Decimal,
}

/// Complete data for rendering the fleet report PDF
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub title: String,
    pub period: String,
    pub currency_symbol: String,
    pub generated: String,
    pub partners: Vec<PartnerSection>,
    /// Only present when the report spans all partners.
    pub summary: Option<ReportSummary>,
}
