mod archive;
mod generator;
mod model;
mod money;

pub use archive::{open_path, ArchivedReport, ReportArchive, ReportName};
pub use generator::{
    build_report, generate_report, report_file_name, DISPLAY_DATE_FORMAT, FILE_DATE_FORMAT,
    FILE_TIME_FORMAT,
};
pub use model::{PartnerSection, ReportData, ReportRequest, ReportRow, ReportScope, ReportSummary};
pub use money::{format_amount, format_money};

use chrono::NaiveDate;

use crate::error::{FleetError, Result};

/// Parse a report date typed as DD/MM/YYYY, DD-MM-YYYY or YYYY-MM-DD
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| FleetError::InvalidDate(input.to_string()))
}
