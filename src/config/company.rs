use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub company: Company,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Company {
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReportSettings {
    pub currency_symbol: String,
    pub output_dir: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            output_dir: "reports".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StorageSettings {
    pub data_file: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: "fleet_data.json".to_string(),
        }
    }
}
