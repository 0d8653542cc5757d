//! Record types for the four county reference datasets, plus CSV/JSON readers.

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

/// Assessor property classification. Unknown classifications round-trip
/// through `Other` rather than failing the load; whether they are taxable
/// is decided by the rate table, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyClass {
    Residential,
    Commercial,
    VacantLand,
    Other(String),
}

impl FromStr for PropertyClass {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Residential" => PropertyClass::Residential,
            "Commercial" => PropertyClass::Commercial,
            "Vacant Land" => PropertyClass::VacantLand,
            other => PropertyClass::Other(other.to_string()),
        })
    }
}

impl fmt::Display for PropertyClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropertyClass::Residential => f.write_str("Residential"),
            PropertyClass::Commercial => f.write_str("Commercial"),
            PropertyClass::VacantLand => f.write_str("Vacant Land"),
            PropertyClass::Other(name) => f.write_str(name),
        }
    }
}

impl From<String> for PropertyClass {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(PropertyClass::Other(s))
    }
}

impl From<PropertyClass> for String {
    fn from(class: PropertyClass) -> Self {
        class.to_string()
    }
}

/// One row of the cleaned `addresses` dataset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddressRecord {
    pub account_number: String,
    pub parcel_number: String,
    #[schemars(with = "String")]
    pub property_type: PropertyClass,
    #[serde(default)]
    pub economic_area: Option<String>,
    pub site_address: String,
}

/// One row of the cleaned `market` dataset.
///
/// `total_assessed_precalc` and `alt_assessed_precalc` are the county's own
/// precomputed assessed figures. They never feed the estimate; the validate
/// command cross-checks them against this engine's results.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MarketRecord {
    pub account_number: String,
    pub parcel_number: String,
    pub total_actual_value: Decimal,
    #[serde(default)]
    pub total_assessed_precalc: Option<Decimal>,
    #[serde(default)]
    pub alt_assessed_precalc: Option<Decimal>,
    pub lg_mill_levy: Decimal,
    pub school_mill_levy: Decimal,
    pub total_mill_levy: Decimal,
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub tax_district: String,
    pub tax_year: i32,
}

/// One row of the cleaned `seniors` dataset. Presence of a record is the
/// senior-exemption flag; the amounts are informational only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SeniorRecord {
    pub account_number: String,
    #[serde(default)]
    pub exempt_actual_value: Option<Decimal>,
    #[serde(default)]
    pub taxes_exempted: Option<Decimal>,
}

/// One row of the cleaned `adjustments` dataset (presence-only).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AdjustmentRecord {
    pub account_number: String,
}

/// The county exports tax districts as bare numbers in JSON and strings in
/// CSV; accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;

    impl serde::de::Visitor<'_> for Visitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(Visitor)
}

/// Read one dataset from CSV with a header row.
pub fn read_csv<T, R>(reader: R) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let records: Result<Vec<T>, _> = rdr.deserialize().collect();
    Ok(records?)
}

/// Read one dataset from a JSON array.
pub fn read_json<T, R>(reader: R) -> anyhow::Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    Ok(serde_json::from_reader(reader)?)
}
