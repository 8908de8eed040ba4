use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{FleetError, Result};

/// One trip record. Edits produce a new value carrying the same `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable identity used by edit/remove. Blobs written before ids
    /// existed get a fresh one on load.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(alias = "vehicleNumber")]
    pub vehicle_number: String,
    #[serde(alias = "driverName")]
    pub driver_name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub incentive: Decimal,
}

impl Entry {
    pub fn new(
        vehicle_number: impl Into<String>,
        driver_name: impl Into<String>,
        amount: Decimal,
        incentive: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_number: vehicle_number.into(),
            driver_name: driver_name.into(),
            amount,
            incentive,
        }
    }

    /// Build an entry from raw form input, validating every field.
    pub fn parse(vehicle: &str, driver: &str, amount: &str, incentive: &str) -> Result<Self> {
        let vehicle_number = required("Vehicle number", vehicle)?;
        let driver_name = required("Driver name", driver)?;
        let amount = parse_decimal("amount", amount)?;
        let incentive = parse_decimal("incentive", incentive)?;
        Ok(Self::new(vehicle_number, driver_name, amount, incentive))
    }

    /// Replacement for this entry built from raw form input. Keeps the id so
    /// the ledger can swap it in place.
    pub fn edited(&self, vehicle: &str, driver: &str, amount: &str, incentive: &str) -> Result<Self> {
        let mut next = Self::parse(vehicle, driver, amount, incentive)?;
        next.id = self.id;
        Ok(next)
    }

    /// Whether this entry credits its vehicle with an incentive.
    pub fn is_incentivized(&self) -> bool {
        self.incentive > Decimal::ZERO
    }
}

/// Normalize a partner name into its ledger key: trimmed, lower-cased,
/// first character upper-cased.
pub fn normalize_partner(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a money field. Blank input is zero.
pub fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(trimmed).map_err(|_| FleetError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

pub(crate) fn required(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FleetError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalizes_partner_names() {
        assert_eq!(normalize_partner("  aCME corp "), "Acme corp");
        assert_eq!(normalize_partner("acme"), "Acme");
        assert_eq!(normalize_partner("ÉCOLE"), "École");
        assert_eq!(normalize_partner("   "), "");
    }

    #[test]
    fn blank_numbers_parse_as_zero() {
        assert_eq!(parse_decimal("amount", "").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("amount", "  ").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("amount", " 12.50 ").unwrap(), dec!(12.50));
    }

    #[test]
    fn garbage_numbers_are_rejected() {
        let err = parse_decimal("incentive", "12a").unwrap_err();
        assert!(matches!(
            err,
            FleetError::InvalidNumber { field: "incentive", .. }
        ));
    }

    #[test]
    fn parse_requires_vehicle_and_driver() {
        assert!(matches!(
            Entry::parse(" ", "Ravi", "10", ""),
            Err(FleetError::MissingField("Vehicle number"))
        ));
        assert!(matches!(
            Entry::parse("KA01", "", "10", ""),
            Err(FleetError::MissingField("Driver name"))
        ));
    }

    #[test]
    fn edited_keeps_identity() {
        let entry = Entry::parse("KA01", "Ravi", "100", "0").unwrap();
        let next = entry.edited("KA01", "Suresh", "100", "0").unwrap();
        assert_eq!(next.id, entry.id);
        assert_eq!(next.driver_name, "Suresh");
    }

    #[test]
    fn reads_legacy_camel_case_without_id() {
        let entry: Entry = serde_json::from_str(
            r#"{"vehicleNumber":"KA01","driverName":"Ravi","amount":100.5,"incentive":0.0}"#,
        )
        .unwrap();
        assert_eq!(entry.vehicle_number, "KA01");
        assert_eq!(entry.amount, dec!(100.5));
        assert!(!entry.is_incentivized());
    }
}
