//! Validate command - surface dataset quality issues without failing the load

use crate::cmd::DatasetArgs;
use crate::records::{MarketRecord, PropertyClass};
use crate::store::{normalize_account, DatasetBundle};
use crate::tax::{calculate_assessed_value, AssessedValue, RateTable};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Mill levy totals and precalculated assessed values are compared within
/// this tolerance; the county rounds to whole dollars in places.
const DRIFT_TOLERANCE: Decimal = dec!(1);

#[derive(Args, Debug)]
pub struct ValidateCommand {
    #[command(flatten)]
    data: DatasetArgs,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: &'static str,
    dataset: &'static str,
    account: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    addresses: usize,
    market: usize,
    seniors: usize,
    adjustments: usize,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let bundle = self.data.read_bundle()?;
        let issues = collect_issues(&bundle);
        let output = ValidationOutput {
            addresses: bundle.addresses.len(),
            market: bundle.market.len(),
            seniors: bundle.seniors.len(),
            adjustments: bundle.adjustments.len(),
            issue_count: issues.len(),
            issues,
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(&output);
        }

        if output.issue_count > 0 {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, output: &ValidationOutput) {
        println!();
        println!("DATASET VALIDATION");
        println!();
        println!(
            "Records: {} addresses, {} market, {} seniors, {} adjustments",
            output.addresses, output.market, output.seniors, output.adjustments
        );
        println!();

        if output.issues.is_empty() {
            println!("\u{2713} No issues found.");
        } else {
            println!("\u{26A0} {} issue(s) found:", output.issues.len());
            println!();
            for (i, issue) in output.issues.iter().enumerate() {
                println!(
                    "  {}. [{}] {} {}: {}",
                    i + 1,
                    issue.issue_type,
                    issue.dataset,
                    issue.account,
                    issue.message
                );
            }
        }
    }
}

fn collect_issues(bundle: &DatasetBundle) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut address_accounts = HashSet::new();
    for record in &bundle.addresses {
        let account = normalize_account(&record.account_number);
        if account.is_empty() {
            issues.push(issue("BlankAccount", "addresses", account, "account number is blank"));
            continue;
        }
        if !address_accounts.insert(account.clone()) {
            issues.push(issue(
                "DuplicateAccount",
                "addresses",
                account,
                "account number appears more than once",
            ));
        }
    }

    let rates = RateTable::default();
    let class_by_account: HashMap<String, &PropertyClass> = bundle
        .addresses
        .iter()
        .map(|a| (normalize_account(&a.account_number), &a.property_type))
        .collect();

    let mut market_accounts = HashSet::new();
    for record in &bundle.market {
        let account = normalize_account(&record.account_number);
        if account.is_empty() {
            issues.push(issue("BlankAccount", "market", account, "account number is blank"));
            continue;
        }
        if !market_accounts.insert(account.clone()) {
            issues.push(issue(
                "DuplicateAccount",
                "market",
                account.clone(),
                "account number appears more than once",
            ));
        }
        if !address_accounts.contains(&account) {
            issues.push(issue(
                "MissingAddress",
                "market",
                account.clone(),
                "no address record for this account",
            ));
        }

        if record.total_actual_value < Decimal::ZERO {
            issues.push(issue(
                "NegativeAmount",
                "market",
                account.clone(),
                format!("total_actual_value is negative ({})", record.total_actual_value),
            ));
        }

        let levy_sum = record.lg_mill_levy + record.school_mill_levy;
        if (record.total_mill_levy - levy_sum).abs() > DRIFT_TOLERANCE {
            issues.push(issue(
                "LevyTotalDrift",
                "market",
                account.clone(),
                format!(
                    "total_mill_levy {} differs from lg + school = {}",
                    record.total_mill_levy, levy_sum
                ),
            ));
        }

        if let Some(&class) = class_by_account.get(&account) {
            issues.extend(precalc_drift(record, class, &rates, &account));
        }
    }

    for record in &bundle.addresses {
        let account = normalize_account(&record.account_number);
        if !account.is_empty() && !market_accounts.contains(&account) {
            issues.push(issue(
                "MissingMarket",
                "addresses",
                account,
                "no market record for this account",
            ));
        }
    }

    for (dataset, accounts) in [
        ("seniors", bundle.seniors.iter().map(|s| s.account_number.as_str()).collect::<Vec<_>>()),
        ("adjustments", bundle.adjustments.iter().map(|a| a.account_number.as_str()).collect()),
    ] {
        for raw in accounts {
            let account = normalize_account(raw);
            if account.is_empty() {
                issues.push(issue("BlankAccount", dataset, account, "account number is blank"));
            } else if !address_accounts.contains(&account) {
                issues.push(issue(
                    "MissingAddress",
                    dataset,
                    account,
                    "no address record for this account",
                ));
            }
        }
    }

    issues
}

/// Compare the county's precomputed assessed values with this engine's
/// results for the same actual value and classification.
fn precalc_drift(
    record: &MarketRecord,
    class: &PropertyClass,
    rates: &RateTable,
    account: &str,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let Ok(assessed) = calculate_assessed_value(record.total_actual_value, class, rates) else {
        return issues;
    };
    let (expected_total, expected_alt) = match &assessed {
        AssessedValue::Single { assessed_value, .. } => (*assessed_value, None),
        AssessedValue::Dual {
            local_government,
            school_district,
            ..
        } => (
            local_government.assessed_value,
            Some(school_district.assessed_value),
        ),
    };

    if let Some(precalc) = record.total_assessed_precalc {
        if (precalc - expected_total).abs() > DRIFT_TOLERANCE {
            issues.push(issue(
                "AssessedDrift",
                "market",
                account.to_string(),
                format!(
                    "county assessed {} differs from computed {} for {}",
                    precalc, expected_total, class
                ),
            ));
        }
    }
    if let (Some(precalc), Some(expected)) = (record.alt_assessed_precalc, expected_alt) {
        if (precalc - expected).abs() > DRIFT_TOLERANCE {
            issues.push(issue(
                "AssessedDrift",
                "market",
                account.to_string(),
                format!(
                    "county alternate assessed {} differs from computed {} for {}",
                    precalc, expected, class
                ),
            ));
        }
    }
    issues
}

fn issue(
    issue_type: &'static str,
    dataset: &'static str,
    account: String,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        issue_type,
        dataset,
        account,
        message: message.into(),
    }
}
