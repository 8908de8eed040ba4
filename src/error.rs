use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Config directory not found at {0}. Run 'fleet init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Please enter a valid number for {field} (got '{value}')")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("Incentive already added for vehicle '{0}'")]
    DuplicateIncentive(String),

    #[error("Partner '{0}' not found")]
    PartnerNotFound(String),

    #[error("Entry not found for partner '{0}'")]
    EntryNotFound(String),

    #[error("No data to display")]
    NoData,

    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Invalid date '{0}'. Expected DD/MM/YYYY or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to write report {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete report {path}: {source}")]
    DeleteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Report '{0}' not found. Use 'fleet reports' to see available reports.")]
    ReportNotFound(String),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Failed to generate PDF: {0}")]
    PdfGeneration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Input errors the user can fix by re-entering data. State is never
    /// touched when one of these is returned.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FleetError::InvalidNumber { .. }
                | FleetError::MissingField(_)
                | FleetError::DuplicateIncentive(_)
                | FleetError::PartnerNotFound(_)
                | FleetError::EntryNotFound(_)
                | FleetError::InvalidDateRange { .. }
                | FleetError::InvalidDate(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
