use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::info;

use super::model::{PartnerSection, ReportData, ReportRequest, ReportRow, ReportScope, ReportSummary};
use crate::error::{FleetError, Result};
use crate::ledger::{normalize_partner, Ledger, LedgerState};
use crate::pdf::ReportRenderer;

/// Date format shown on reports
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date and time formats used inside report file names
pub const FILE_DATE_FORMAT: &str = "%d-%m-%Y";
pub const FILE_TIME_FORMAT: &str = "%H-%M-%S";

const REPORT_TITLE: &str = "Fleet Report";

/// Build the report model for `state`. Fails with `NoData` instead of
/// producing an empty document.
pub fn build_report(state: &LedgerState, request: &ReportRequest) -> Result<ReportData> {
    if request.start > request.end {
        return Err(FleetError::InvalidDateRange {
            start: request.start.format(DISPLAY_DATE_FORMAT).to_string(),
            end: request.end.format(DISPLAY_DATE_FORMAT).to_string(),
        });
    }

    if state.ledger.is_empty() {
        return Err(FleetError::NoData);
    }

    // Resolve the scope
    let (ledger, title) = match &request.scope {
        ReportScope::All => (
            state.ledger.clone(),
            format!("{} {}", request.company, REPORT_TITLE),
        ),
        ReportScope::Partner(name) => {
            let key = normalize_partner(name);
            let ledger = state
                .ledger
                .only(&key)
                .ok_or_else(|| FleetError::PartnerNotFound(key.clone()))?;
            (ledger, key)
        }
    };

    let partners = partner_sections(&ledger, state);

    let summary = match request.scope {
        ReportScope::All => {
            let mut summary = ReportSummary::default();
            for section in &partners {
                summary.amount += section.amount;
                summary.incentive += section.incentive;
                summary.commission += section.commission;
            }
            summary.payable = summary.amount + summary.incentive - summary.commission;
            Some(summary)
        }
        ReportScope::Partner(_) => None,
    };

    Ok(ReportData {
        title,
        period: format!(
            "From {} to {}",
            request.start.format(DISPLAY_DATE_FORMAT),
            request.end.format(DISPLAY_DATE_FORMAT)
        ),
        currency_symbol: request.currency_symbol.clone(),
        generated: request
            .generated_at
            .format("%d/%m/%Y %H:%M:%S")
            .to_string(),
        partners,
        summary,
    })
}

fn partner_sections(ledger: &Ledger, state: &LedgerState) -> Vec<PartnerSection> {
    ledger
        .partners()
        .map(|(name, entries)| {
            let rows: Vec<ReportRow> = entries
                .iter()
                .map(|e| ReportRow {
                    vehicle_number: e.vehicle_number.clone(),
                    driver_name: e.driver_name.clone(),
                    amount: e.amount,
                    incentive: e.incentive,
                })
                .collect();

            let amount: Decimal = entries.iter().map(|e| e.amount).sum();
            let incentive: Decimal = entries.iter().map(|e| e.incentive).sum();
            let meta = state.meta_for(name);
            let remarks = Some(meta.remarks).filter(|r| !r.is_empty());

            PartnerSection {
                name: name.to_string(),
                rows,
                amount,
                incentive,
                commission: meta.commission,
                payable: amount + incentive - meta.commission,
                remarks,
            }
        })
        .collect()
}

/// `<company>--<start>--<end>--<HH-MM-SS>.pdf`, with `/` made safe for
/// the filesystem
pub fn report_file_name(request: &ReportRequest) -> String {
    let company = match &request.scope {
        ReportScope::All => request.company.clone(),
        ReportScope::Partner(name) => normalize_partner(name),
    };
    format!(
        "{}--{}--{}--{}.pdf",
        company.trim().replace(['/', '\\'], "-"),
        request.start.format(FILE_DATE_FORMAT),
        request.end.format(FILE_DATE_FORMAT),
        request.generated_at.format(FILE_TIME_FORMAT)
    )
}

/// Build and render a report into `output_dir`.
///
/// The renderer writes to a hidden temp file next to the target which is
/// renamed into place only once rendering succeeded, so a failed run leaves
/// nothing behind.
pub fn generate_report(
    state: &LedgerState,
    request: &ReportRequest,
    output_dir: &Path,
    renderer: &dyn ReportRenderer,
) -> Result<PathBuf> {
    let data = build_report(state, request)?;

    std::fs::create_dir_all(output_dir).map_err(|source| FleetError::WriteFailure {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let file_name = report_file_name(request);
    let pdf_path = output_dir.join(&file_name);
    let tmp_path = output_dir.join(format!(".{}.tmp.pdf", file_name.trim_end_matches(".pdf")));

    if let Err(e) = renderer.render(&data, &tmp_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(match e {
            FleetError::Io(source) => FleetError::WriteFailure {
                path: pdf_path,
                source,
            },
            other => other,
        });
    }

    if let Err(source) = std::fs::rename(&tmp_path, &pdf_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(FleetError::WriteFailure {
            path: pdf_path,
            source,
        });
    }

    info!(
        path = %pdf_path.display(),
        partners = data.partners.len(),
        "report written"
    );
    Ok(pdf_path)
}
