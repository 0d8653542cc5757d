//! Estimate command - assessed value and tax for a property

use crate::cmd::{search, DatasetArgs};
use crate::display::{format_levy, format_percent, format_usd};
use crate::records::{MarketRecord, PropertyClass};
use crate::resolve::{LookupError, PropertyResolver, Resolution, ResolvedProperty};
use crate::tax::{
    calculate_assessed_value, calculate_taxes, AssessedValue, MillLevies, RateTable, TaxResult,
    UnknownClassPolicy,
};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct EstimateCommand {
    #[command(flatten)]
    data: DatasetArgs,

    /// Account number to estimate (case-insensitive)
    #[arg(short, long)]
    account: Option<String>,

    /// Site address fragment; must narrow to a single property
    #[arg(short = 'q', long)]
    address: Option<String>,

    /// Actual (market) value; overrides the assessor figure when a property
    /// is resolved, required otherwise
    #[arg(long)]
    actual_value: Option<Decimal>,

    /// Property classification, e.g. Residential, Commercial, "Vacant Land";
    /// overrides the assessor classification when a property is resolved
    #[arg(long)]
    property_type: Option<PropertyClass>,

    /// Local government mill levy override
    #[arg(long)]
    lg_levy: Option<Decimal>,

    /// School district mill levy override
    #[arg(long)]
    school_levy: Option<Decimal>,

    /// Combined mill levy override (single-rate classifications)
    #[arg(long)]
    total_levy: Option<Decimal>,

    /// Refuse property classes with no configured assessment rate instead of
    /// assuming the residential policy
    #[arg(long)]
    strict_classes: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl EstimateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let property = self.resolve_property()?;

        let actual_value = self
            .actual_value
            .or_else(|| property.as_ref().map(|p| p.market.total_actual_value))
            .ok_or_else(|| {
                anyhow::anyhow!("--actual-value is required without --account or --address")
            })?;
        if actual_value < Decimal::ZERO {
            anyhow::bail!("actual value cannot be negative");
        }

        let class = self
            .property_type
            .clone()
            .or_else(|| property.as_ref().map(|p| p.address.property_type.clone()))
            .ok_or_else(|| {
                anyhow::anyhow!("--property-type is required without --account or --address")
            })?;

        let rates = if self.strict_classes {
            RateTable::with_unknown_policy(UnknownClassPolicy::Reject)
        } else {
            RateTable::default()
        };

        let assessed = calculate_assessed_value(actual_value, &class, &rates)?;
        let levies = self.levies(property.as_ref().map(|p| &p.market), &assessed)?;
        let taxes = calculate_taxes(&assessed, &levies);

        if self.json {
            let output = EstimateOutput {
                account_number: property.as_ref().map(|p| p.account_number.as_str()),
                site_address: property.as_ref().map(|p| p.address.site_address.as_str()),
                tax_district: property.as_ref().map(|p| p.market.tax_district.as_str()),
                tax_year: property.as_ref().map(|p| p.market.tax_year),
                property_type: class.to_string(),
                actual_value,
                has_senior_exemption: property.as_ref().map(|p| p.has_senior_exemption()),
                has_adjustment: property.as_ref().map(|p| p.has_adjustment),
                assessed: &assessed,
                taxes: &taxes,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(property.as_ref(), &class, actual_value, &assessed, &taxes);
        }
        Ok(())
    }

    /// Resolve the target property, or `None` for a standalone estimate
    /// described entirely on the command line (no datasets touched).
    fn resolve_property(&self) -> anyhow::Result<Option<ResolvedProperty>> {
        match (&self.account, &self.address) {
            (None, None) => {
                if self.actual_value.is_none() || self.property_type.is_none() {
                    anyhow::bail!(
                        "select a property with --account or --address, or describe one with --actual-value and --property-type"
                    );
                }
                Ok(None)
            }
            (Some(_), Some(_)) => anyhow::bail!("provide at most one of --account or --address"),
            (account, address) => {
                let store = self.data.load_store()?;
                let mut resolver = PropertyResolver::new(&store);
                let outcome = match (account, address) {
                    (Some(account), None) => resolver
                        .resolve_by_account(account)
                        .map(Resolution::Property),
                    (None, Some(query)) => resolver.resolve_by_address(query),
                    _ => unreachable!("handled above"),
                };
                match outcome {
                    Ok(Resolution::Property(property)) => Ok(Some(property)),
                    Ok(Resolution::Candidates(candidates)) => {
                        println!(
                            "{} properties match; narrow the address or estimate by account:",
                            candidates.len()
                        );
                        search::print_candidates(&candidates);
                        std::process::exit(1);
                    }
                    Err(LookupError::NotFound) => {
                        println!("Property not found. Check the account number or address fragment.");
                        std::process::exit(1);
                    }
                    Err(err @ LookupError::NotReady) => Err(err.into()),
                }
            }
        }
    }

    /// Combine the market record's levies with any overrides, requiring the
    /// pieces the assessed shape actually consumes.
    fn levies(
        &self,
        market: Option<&MarketRecord>,
        assessed: &AssessedValue,
    ) -> anyhow::Result<MillLevies> {
        for (name, levy) in [
            ("--lg-levy", self.lg_levy),
            ("--school-levy", self.school_levy),
            ("--total-levy", self.total_levy),
        ] {
            if levy.is_some_and(|l| l < Decimal::ZERO) {
                anyhow::bail!("{name} cannot be negative");
            }
        }

        let component_override = self.lg_levy.is_some() || self.school_levy.is_some();
        if !component_override && self.total_levy.is_none() {
            if let Some(market) = market {
                return Ok(MillLevies::from(market));
            }
        }

        let local_government = self.lg_levy.or_else(|| market.map(|m| m.lg_mill_levy));
        let school_district = self.school_levy.or_else(|| market.map(|m| m.school_mill_levy));
        // A component override invalidates the assessor's combined figure;
        // the sum takes over unless --total-levy says otherwise.
        let total_mill_levy = self.total_levy.or_else(|| {
            if component_override {
                None
            } else {
                market.map(|m| m.total_mill_levy)
            }
        });

        match assessed {
            AssessedValue::Dual { .. } => {
                let (Some(local_government), Some(school_district)) =
                    (local_government, school_district)
                else {
                    anyhow::bail!(
                        "dual-rate estimates need --lg-levy and --school-levy (or a resolved property)"
                    );
                };
                Ok(MillLevies {
                    local_government,
                    school_district,
                    total_mill_levy,
                })
            }
            AssessedValue::Single { .. } => {
                if total_mill_levy.is_none()
                    && (local_government.is_none() || school_district.is_none())
                {
                    anyhow::bail!(
                        "single-rate estimates need --total-levy, or both --lg-levy and --school-levy"
                    );
                }
                Ok(MillLevies {
                    local_government: local_government.unwrap_or(Decimal::ZERO),
                    school_district: school_district.unwrap_or(Decimal::ZERO),
                    total_mill_levy,
                })
            }
        }
    }

    fn print_text(
        &self,
        property: Option<&ResolvedProperty>,
        class: &PropertyClass,
        actual_value: Decimal,
        assessed: &AssessedValue,
        taxes: &TaxResult,
    ) {
        println!();
        println!("TAX ESTIMATE");
        println!();
        if let Some(property) = property {
            println!("Account Number:  {}", property.account_number);
            println!("Site Address:    {}", property.address.site_address);
            println!("Tax District:    {}", property.market.tax_district);
            println!("Tax Year:        {}", property.market.tax_year);
        }
        println!("Property Type:   {class}");
        println!("Actual Value:    {}", format_usd(actual_value));
        if let Some(property) = property {
            if property.has_senior_exemption() {
                println!("Note: senior exemption on file; not applied to this estimate.");
            }
            if property.has_adjustment {
                println!("Note: special district adjustment on file; not applied to this estimate.");
            }
        }

        println!();
        println!("ASSESSED VALUE");
        print_table(assessment_rows(assessed));

        println!();
        println!("TAXES");
        print_table(tax_rows(taxes));

        println!();
        println!("Estimated Tax:   {}", format_usd(taxes.total()));
    }
}

#[derive(Tabled)]
struct AssessmentRow {
    #[tabled(rename = "Authority")]
    authority: &'static str,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Assessed Value")]
    assessed_value: String,
}

fn assessment_rows(assessed: &AssessedValue) -> Vec<AssessmentRow> {
    match assessed {
        AssessedValue::Single { rate, assessed_value, .. } => vec![AssessmentRow {
            authority: "All Authorities",
            rate: format_percent(*rate),
            assessed_value: format_usd(*assessed_value),
        }],
        AssessedValue::Dual {
            local_government,
            school_district,
            ..
        } => vec![
            AssessmentRow {
                authority: "Local Government",
                rate: format_percent(local_government.rate),
                assessed_value: format_usd(local_government.assessed_value),
            },
            AssessmentRow {
                authority: "School District",
                rate: format_percent(school_district.rate),
                assessed_value: format_usd(school_district.assessed_value),
            },
        ],
    }
}

#[derive(Tabled)]
struct TaxRow {
    #[tabled(rename = "Authority")]
    authority: &'static str,
    #[tabled(rename = "Assessed Value")]
    assessed_value: String,
    #[tabled(rename = "Mill Levy")]
    mill_levy: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

fn tax_rows(taxes: &TaxResult) -> Vec<TaxRow> {
    match taxes {
        TaxResult::Single {
            assessed_value,
            total_mill_levy,
            total,
        } => vec![TaxRow {
            authority: "All Authorities",
            assessed_value: format_usd(*assessed_value),
            mill_levy: format_levy(*total_mill_levy),
            tax: format_usd(*total),
        }],
        TaxResult::Dual {
            local_government,
            school_district,
            ..
        } => vec![
            TaxRow {
                authority: "Local Government",
                assessed_value: format_usd(local_government.assessed_value),
                mill_levy: format_levy(local_government.mill_levy),
                tax: format_usd(local_government.tax),
            },
            TaxRow {
                authority: "School District",
                assessed_value: format_usd(school_district.assessed_value),
                mill_levy: format_levy(school_district.mill_levy),
                tax: format_usd(school_district.tax),
            },
        ],
    }
}

fn print_table<R: Tabled>(rows: Vec<R>) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// JSON shape for an estimate, carrying the raw decimal values.
#[derive(Serialize)]
struct EstimateOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    account_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_address: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_district: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_year: Option<i32>,
    property_type: String,
    actual_value: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_senior_exemption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_adjustment: Option<bool>,
    assessed: &'a AssessedValue,
    taxes: &'a TaxResult,
}
