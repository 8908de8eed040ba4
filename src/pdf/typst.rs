use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use super::ReportRenderer;
use crate::error::{FleetError, Result};
use crate::report::ReportData;

/// Embedded Typst template for fleet report generation
/// Uses a placeholder that gets replaced with the actual JSON file path
const REPORT_TEMPLATE: &str = r##"// Fleet Report Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  margin: (top: 0.8in, bottom: 0.8in, left: 0.7in, right: 0.7in),
)

#set text(font: "Helvetica", size: 10pt)

#let money(amount) = data.currency_symbol + amount
#let band = luma(200)
#let stripe = luma(240)

// Header
#align(center)[
  #text(size: 18pt, weight: "bold")[#data.title]
  #v(0.2em)
  #text(size: 14pt, style: "italic")[#data.period]
]

#v(1.5em)

// One table per partner
#for partner in data.partners [
  #text(size: 14pt, weight: "bold")[Partner Name: #partner.name]
  #v(0.4em)
  #table(
    columns: (3fr, 3fr, 2fr, 2fr),
    align: center,
    inset: 7pt,
    stroke: 0.5pt + gray,
    fill: (x, y) => if y == 0 { band } else if calc.even(y) { stripe } else { none },

    // Header
    [*Vehicle Number*], [*Driver Name*], [*Amount*], [*Incentive*],

    // Rows
    ..partner.rows.map(row => (
      row.vehicle_number,
      row.driver_name,
      money(row.amount),
      money(row.incentive),
    )).flatten(),

    // Totals
    table.cell(colspan: 2, align: right, fill: band)[Total],
    table.cell(fill: band)[#money(partner.amount)],
    table.cell(fill: band)[#money(partner.incentive)],

    table.cell(colspan: 2, align: right, fill: white)[Total Incentive],
    table.cell(fill: white)[+#money(partner.incentive)], table.cell(fill: white)[],

    table.cell(colspan: 2, align: right, fill: white)[Total Commission],
    table.cell(fill: white)[-#money(partner.commission)], table.cell(fill: white)[],

    table.cell(colspan: 2, align: right, fill: band)[*Payable*],
    table.cell(fill: band)[*#money(partner.payable)*], table.cell(fill: band)[],

    ..if partner.remarks != none {
      (
        table.cell(fill: stripe)[Remarks],
        table.cell(colspan: 3, fill: stripe)[#partner.remarks],
      )
    } else {
      ()
    },
  )
  #v(1.2em)
]

// Grand summary across all partners
#if data.summary != none [
  #v(1em)
  #table(
    columns: (1fr, 1fr),
    align: center,
    inset: 7pt,
    stroke: 0.5pt + gray,
    fill: (x, y) => if y == 0 { band } else { stripe },

    table.cell(colspan: 2)[*Fleet Report Summary*],
    [Total Amount], [#money(data.summary.amount)],
    [Total Incentive], [#money(data.summary.incentive)],
    [Total Commission], [#money(data.summary.commission)],
    [Total Payable Amount], [*#money(data.summary.payable)*],
  )
]

#v(2em)
#align(right)[#text(size: 8pt, fill: gray)[Generated #data.generated]]
"##;

/// Renders reports by compiling the embedded template with the Typst CLI.
#[derive(Debug, Clone)]
pub struct TypstRenderer {
    binary: PathBuf,
    work_dir: PathBuf,
}

impl Default for TypstRenderer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("typst"),
            work_dir: std::env::temp_dir().join("fleet-report"),
        }
    }
}

impl TypstRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `typst` executable instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Place scratch directories under `work_dir` instead of the system temp dir.
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Fresh scratch directory for one render, removed when dropped.
    fn scratch_dir(&self) -> Result<TempDir> {
        std::fs::create_dir_all(&self.work_dir)?;
        Ok(tempfile::Builder::new()
            .prefix("render-")
            .tempdir_in(&self.work_dir)?)
    }
}

impl ReportRenderer for TypstRenderer {
    fn render(&self, report: &ReportData, output_path: &Path) -> Result<()> {
        // Check if typst is available
        let typst_check = Command::new(&self.binary).arg("--version").output();

        if typst_check.is_err() {
            return Err(FleetError::TypstNotFound);
        }

        let scratch_dir = self.scratch_dir()?;
        let scratch = scratch_dir.path();

        // Serialize report data to JSON
        let json_data = serde_json::to_string(report)
            .map_err(|e| FleetError::PdfGeneration(e.to_string()))?;

        let json_path = scratch.join("report_data.json");
        std::fs::write(&json_path, &json_data)?;

        // Write template with relative JSON path
        let template_content = REPORT_TEMPLATE.replace("DATA_JSON_PATH", "report_data.json");
        let template_path = scratch.join("report.typ");
        std::fs::write(&template_path, &template_content)?;

        // Run typst compile with root set to the scratch directory
        let output = Command::new(&self.binary)
            .arg("compile")
            .arg("--root")
            .arg(scratch)
            .arg(&template_path)
            .arg(output_path)
            .output()?;

        // Clean up temp files
        let _ = scratch_dir.close();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FleetError::PdfGeneration(stderr.to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binary_is_reported() {
        let renderer = TypstRenderer::new().with_binary("/nonexistent/typst-binary");
        let report = ReportData {
            title: "Acme Fleet Report".into(),
            period: "From 01/10/2026 to 18/10/2026".into(),
            currency_symbol: "₹".into(),
            generated: "18/10/2026 10:00:00".into(),
            partners: Vec::new(),
            summary: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let result = renderer.render(&report, &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(FleetError::TypstNotFound)));
    }

    #[test]
    fn each_render_gets_its_own_scratch_dir() {
        let work = tempfile::tempdir().unwrap();
        let renderer = TypstRenderer::new().with_work_dir(work.path().join("scratch"));

        let first = renderer.scratch_dir().unwrap();
        let second = renderer.scratch_dir().unwrap();
        assert_ne!(first.path(), second.path());
        assert!(first.path().starts_with(work.path()));

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        assert!(second.path().exists());
    }
}
