pub mod config;
pub mod error;
pub mod ledger;
pub mod pdf;
pub mod report;
pub mod store;

pub use config::{Company, Config};
pub use error::{FleetError, Result};
pub use ledger::{Entry, EntryForm, IncentiveIndex, Ledger, LedgerService, LedgerState, PartnerMeta};
pub use pdf::{ReportRenderer, TypstRenderer};
pub use report::{generate_report, ReportArchive, ReportRequest, ReportScope};
pub use store::LedgerStore;
