//! Schema command - print expected dataset formats

use crate::records::{AddressRecord, AdjustmentRecord, MarketRecord, SeniorRecord};
use clap::{Args, ValueEnum};
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Dataset to describe
    #[arg(value_enum)]
    dataset: DatasetKind,

    /// Output format
    #[arg(long, value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DatasetKind {
    Addresses,
    Market,
    Seniors,
    Adjustments,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the record format
    JsonSchema,
    /// CSV header row with column names
    CsvHeader,
    /// CSV column descriptions
    CsvFields,
}

/// name, required, description
type CsvField = (&'static str, bool, &'static str);

const ADDRESS_FIELDS: &[CsvField] = &[
    ("account_number", true, "Unique parcel account number"),
    ("parcel_number", true, "Assessor parcel number"),
    ("property_type", true, "Classification, e.g. Residential, Commercial, Vacant Land"),
    ("economic_area", false, "Assessor economic area code"),
    ("site_address", true, "Street address of the parcel"),
];

const MARKET_FIELDS: &[CsvField] = &[
    ("account_number", true, "Unique parcel account number"),
    ("parcel_number", true, "Assessor parcel number"),
    ("total_actual_value", true, "Actual (market) value in dollars"),
    ("total_assessed_precalc", false, "County precomputed assessed value"),
    ("alt_assessed_precalc", false, "County precomputed alternate assessed value"),
    ("lg_mill_levy", true, "Local government mill levy"),
    ("school_mill_levy", true, "School district mill levy"),
    ("total_mill_levy", true, "Combined mill levy"),
    ("tax_district", true, "Taxing district code"),
    ("tax_year", true, "Assessment tax year"),
];

const SENIOR_FIELDS: &[CsvField] = &[
    ("account_number", true, "Unique parcel account number"),
    ("exempt_actual_value", false, "Actual value exempted for the senior"),
    ("taxes_exempted", false, "Dollar amount of taxes exempted"),
];

const ADJUSTMENT_FIELDS: &[CsvField] = &[("account_number", true, "Unique parcel account number")];

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::CsvHeader => {
                let columns: Vec<&str> = self.fields().iter().map(|(name, _, _)| *name).collect();
                println!("{}", columns.join(","));
                Ok(())
            }
            SchemaFormat::CsvFields => {
                for (name, required, description) in self.fields() {
                    let marker = if *required { "required" } else { "optional" };
                    println!("{name:24} {marker:8} {description}");
                }
                Ok(())
            }
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = match self.dataset {
            DatasetKind::Addresses => schema_for!(AddressRecord),
            DatasetKind::Market => schema_for!(MarketRecord),
            DatasetKind::Seniors => schema_for!(SeniorRecord),
            DatasetKind::Adjustments => schema_for!(AdjustmentRecord),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn fields(&self) -> &'static [CsvField] {
        match self.dataset {
            DatasetKind::Addresses => ADDRESS_FIELDS,
            DatasetKind::Market => MARKET_FIELDS,
            DatasetKind::Seniors => SENIOR_FIELDS,
            DatasetKind::Adjustments => ADJUSTMENT_FIELDS,
        }
    }
}
