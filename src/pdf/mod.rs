mod typst;

pub use typst::TypstRenderer;

use std::path::Path;

use crate::error::Result;
use crate::report::ReportData;

/// Turns a report model into a document at `output_path`.
pub trait ReportRenderer {
    fn render(&self, report: &ReportData, output_path: &Path) -> Result<()>;
}
