//! Search command - substring search over site addresses

use crate::cmd::DatasetArgs;
use crate::records::AddressRecord;
use crate::store::MAX_ADDRESS_MATCHES;
use clap::Args;
use std::io;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SearchCommand {
    #[command(flatten)]
    data: DatasetArgs,

    /// Site address fragment (at least 2 characters)
    query: String,

    /// Output as CSV instead of a formatted table
    #[arg(long)]
    csv: bool,
}

impl SearchCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let store = self.data.load_store()?;
        let matches = store.search_by_site_address(&self.query);

        if matches.is_empty() {
            println!("No site addresses match {:?}.", self.query.trim());
            return Ok(());
        }

        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for address in &matches {
                wtr.serialize(address)?;
            }
            wtr.flush()?;
        } else {
            print_candidates(&matches.iter().map(|a| (*a).clone()).collect::<Vec<_>>());
            if matches.len() == MAX_ADDRESS_MATCHES {
                println!("Showing the first {MAX_ADDRESS_MATCHES} matches; narrow the query to see others.");
            }
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Site Address")]
    site_address: String,
    #[tabled(rename = "Type")]
    property_type: String,
    #[tabled(rename = "Parcel")]
    parcel: String,
}

/// Shared with the lookup command's ambiguous-match path.
pub fn print_candidates(candidates: &[AddressRecord]) {
    let rows: Vec<CandidateRow> = candidates
        .iter()
        .map(|address| CandidateRow {
            account: address.account_number.clone(),
            site_address: address.site_address.clone(),
            property_type: address.property_type.to_string(),
            parcel: address.parcel_number.clone(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::left()))
        .to_string();
    println!("{table}");
}
