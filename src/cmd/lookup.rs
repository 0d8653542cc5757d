//! Lookup command - resolve a property by account number or address fragment

use crate::cmd::{search, DatasetArgs};
use crate::display::{format_levy, format_usd};
use crate::records::SeniorRecord;
use crate::resolve::{LookupError, PropertyResolver, Resolution, ResolvedProperty};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct LookupCommand {
    #[command(flatten)]
    data: DatasetArgs,

    /// Account number (case-insensitive)
    #[arg(short, long)]
    account: Option<String>,

    /// Site address fragment
    #[arg(short = 'q', long)]
    address: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl LookupCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let store = self.data.load_store()?;
        let mut resolver = PropertyResolver::new(&store);

        let outcome = match (&self.account, &self.address) {
            (Some(account), None) => resolver
                .resolve_by_account(account)
                .map(Resolution::Property),
            (None, Some(query)) => resolver.resolve_by_address(query),
            _ => anyhow::bail!("provide exactly one of --account or --address"),
        };

        match outcome {
            Ok(Resolution::Property(property)) => {
                if self.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&PropertyView::from(&property))?
                    );
                } else {
                    print_property(&property);
                }
                Ok(())
            }
            Ok(Resolution::Candidates(candidates)) => {
                println!("{} properties match; refine the search or look one up by account:", candidates.len());
                search::print_candidates(&candidates);
                Ok(())
            }
            Err(LookupError::NotFound) => {
                println!("Property not found. Check the account number or try a different address fragment.");
                std::process::exit(1);
            }
            Err(err @ LookupError::NotReady) => Err(err.into()),
        }
    }
}

/// JSON shape for a resolved property.
#[derive(Serialize)]
struct PropertyView<'a> {
    account_number: &'a str,
    site_address: &'a str,
    property_type: String,
    parcel_number: &'a str,
    economic_area: Option<&'a str>,
    total_actual_value: Decimal,
    tax_district: &'a str,
    tax_year: i32,
    lg_mill_levy: Decimal,
    school_mill_levy: Decimal,
    total_mill_levy: Decimal,
    has_senior_exemption: bool,
    senior: Option<&'a SeniorRecord>,
    has_adjustment: bool,
}

impl<'a> From<&'a ResolvedProperty> for PropertyView<'a> {
    fn from(property: &'a ResolvedProperty) -> Self {
        PropertyView {
            account_number: &property.account_number,
            site_address: &property.address.site_address,
            property_type: property.address.property_type.to_string(),
            parcel_number: &property.address.parcel_number,
            economic_area: property.address.economic_area.as_deref(),
            total_actual_value: property.market.total_actual_value,
            tax_district: &property.market.tax_district,
            tax_year: property.market.tax_year,
            lg_mill_levy: property.market.lg_mill_levy,
            school_mill_levy: property.market.school_mill_levy,
            total_mill_levy: property.market.total_mill_levy,
            has_senior_exemption: property.has_senior_exemption(),
            senior: property.senior.as_ref(),
            has_adjustment: property.has_adjustment,
        }
    }
}

fn print_property(property: &ResolvedProperty) {
    let address = &property.address;
    let market = &property.market;

    println!("Account Number:  {}", property.account_number);
    println!("Site Address:    {}", address.site_address);
    println!("Property Type:   {}", address.property_type);
    println!("Parcel Number:   {}", address.parcel_number);
    if let Some(area) = &address.economic_area {
        println!("Economic Area:   {area}");
    }
    println!("Actual Value:    {}", format_usd(market.total_actual_value));
    println!("Tax District:    {}", market.tax_district);
    println!("Tax Year:        {}", market.tax_year);
    println!(
        "Mill Levies:     {} local government, {} school district, {} total",
        format_levy(market.lg_mill_levy),
        format_levy(market.school_mill_levy),
        format_levy(market.total_mill_levy),
    );
    match &property.senior {
        Some(senior) => println!("Senior Exemption: on file{}", senior_amounts(senior)),
        None => println!("Senior Exemption: none"),
    }
    println!(
        "Special District Adjustment: {}",
        if property.has_adjustment { "on file" } else { "none" }
    );
}

fn senior_amounts(senior: &SeniorRecord) -> String {
    match (senior.exempt_actual_value, senior.taxes_exempted) {
        (Some(value), Some(taxes)) => format!(
            " (exempt actual value {}, taxes exempted {})",
            format_usd(value),
            format_usd(taxes)
        ),
        (Some(value), None) => format!(" (exempt actual value {})", format_usd(value)),
        (None, Some(taxes)) => format!(" (taxes exempted {})", format_usd(taxes)),
        (None, None) => String::new(),
    }
}
