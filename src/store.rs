//! Reference store: indexes the four county datasets for point lookups and
//! bounded address search.

use crate::records::{AddressRecord, AdjustmentRecord, MarketRecord, SeniorRecord};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Address search returns at most this many candidates, in dataset order.
pub const MAX_ADDRESS_MATCHES: usize = 10;
/// Address queries shorter than this (after trimming) match nothing.
pub const MIN_QUERY_CHARS: usize = 2;

/// The four datasets, already read into memory, handed to [`ReferenceStore::load`]
/// as one atomic group.
#[derive(Debug, Default)]
pub struct DatasetBundle {
    pub addresses: Vec<AddressRecord>,
    pub market: Vec<MarketRecord>,
    pub seniors: Vec<SeniorRecord>,
    pub adjustments: Vec<AdjustmentRecord>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{dataset} record {index}: account number is blank")]
    BlankAccountNumber { dataset: &'static str, index: usize },
    #[error("{dataset} record {index} ({account}): {field} is negative ({value})")]
    NegativeAmount {
        dataset: &'static str,
        index: usize,
        account: String,
        field: &'static str,
        value: Decimal,
    },
}

/// Canonical form of an account number: trimmed, upper-cased.
pub fn normalize_account(account: &str) -> String {
    account.trim().to_uppercase()
}

struct Indices {
    // Dataset order preserved; address search iterates this directly.
    addresses: Vec<AddressRecord>,
    address_by_account: HashMap<String, usize>,
    market_by_account: HashMap<String, MarketRecord>,
    senior_by_account: HashMap<String, SeniorRecord>,
    adjustment_accounts: HashSet<String>,
}

impl Indices {
    fn build(bundle: DatasetBundle) -> Result<Self, LoadError> {
        let mut addresses = Vec::with_capacity(bundle.addresses.len());
        let mut address_by_account = HashMap::with_capacity(bundle.addresses.len());
        for (index, mut record) in bundle.addresses.into_iter().enumerate() {
            record.account_number = checked_account(&record.account_number, "addresses", index)?;
            address_by_account.insert(record.account_number.clone(), addresses.len());
            addresses.push(record);
        }

        let mut market_by_account = HashMap::with_capacity(bundle.market.len());
        for (index, mut record) in bundle.market.into_iter().enumerate() {
            record.account_number = checked_account(&record.account_number, "market", index)?;
            let amounts = [
                ("total_actual_value", record.total_actual_value),
                ("lg_mill_levy", record.lg_mill_levy),
                ("school_mill_levy", record.school_mill_levy),
                ("total_mill_levy", record.total_mill_levy),
            ];
            for (field, value) in amounts {
                if value < Decimal::ZERO {
                    return Err(LoadError::NegativeAmount {
                        dataset: "market",
                        index,
                        account: record.account_number.clone(),
                        field,
                        value,
                    });
                }
            }
            market_by_account.insert(record.account_number.clone(), record);
        }

        let mut senior_by_account = HashMap::with_capacity(bundle.seniors.len());
        for (index, mut record) in bundle.seniors.into_iter().enumerate() {
            record.account_number = checked_account(&record.account_number, "seniors", index)?;
            senior_by_account.insert(record.account_number.clone(), record);
        }

        let mut adjustment_accounts = HashSet::with_capacity(bundle.adjustments.len());
        for (index, record) in bundle.adjustments.into_iter().enumerate() {
            adjustment_accounts.insert(checked_account(&record.account_number, "adjustments", index)?);
        }

        Ok(Indices {
            addresses,
            address_by_account,
            market_by_account,
            senior_by_account,
            adjustment_accounts,
        })
    }
}

fn checked_account(raw: &str, dataset: &'static str, index: usize) -> Result<String, LoadError> {
    let account = normalize_account(raw);
    if account.is_empty() {
        return Err(LoadError::BlankAccountNumber { dataset, index });
    }
    Ok(account)
}

/// In-memory index over the four reference datasets. Not ready until a
/// [`load`](ReferenceStore::load) succeeds; immutable afterwards.
#[derive(Default)]
pub struct ReferenceStore {
    indices: Option<Indices>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index all four datasets as one atomic group. On failure the store is
    /// left not-ready, dropping any indices from an earlier successful load.
    pub fn load(&mut self, bundle: DatasetBundle) -> Result<(), LoadError> {
        self.indices = None;
        let indices = Indices::build(bundle)?;
        log::info!(
            "reference store ready: {} addresses, {} market records, {} seniors, {} adjustments",
            indices.addresses.len(),
            indices.market_by_account.len(),
            indices.senior_by_account.len(),
            indices.adjustment_accounts.len(),
        );
        self.indices = Some(indices);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.indices.is_some()
    }

    /// Point lookup by normalized account number.
    pub fn address(&self, account: &str) -> Option<&AddressRecord> {
        let indices = self.indices.as_ref()?;
        let position = indices.address_by_account.get(account)?;
        indices.addresses.get(*position)
    }

    pub fn market(&self, account: &str) -> Option<&MarketRecord> {
        self.indices.as_ref()?.market_by_account.get(account)
    }

    pub fn senior(&self, account: &str) -> Option<&SeniorRecord> {
        self.indices.as_ref()?.senior_by_account.get(account)
    }

    /// Flag-only convenience over [`senior`](Self::senior).
    #[allow(dead_code)]
    pub fn has_senior_exemption(&self, account: &str) -> bool {
        self.senior(account).is_some()
    }

    pub fn has_adjustment(&self, account: &str) -> bool {
        self.indices
            .as_ref()
            .is_some_and(|indices| indices.adjustment_accounts.contains(account))
    }

    /// Case-insensitive substring search over site addresses. Returns the
    /// first [`MAX_ADDRESS_MATCHES`] matches in dataset order; empty when the
    /// store is not ready or the trimmed query is shorter than
    /// [`MIN_QUERY_CHARS`].
    pub fn search_by_site_address(&self, query: &str) -> Vec<&AddressRecord> {
        let Some(indices) = self.indices.as_ref() else {
            return Vec::new();
        };
        let needle = query.trim().to_lowercase();
        if needle.chars().count() < MIN_QUERY_CHARS {
            return Vec::new();
        }
        let mut matches = Vec::new();
        for address in &indices.addresses {
            if address.site_address.to_lowercase().contains(&needle) {
                matches.push(address);
                if matches.len() == MAX_ADDRESS_MATCHES {
                    break;
                }
            }
        }
        matches
    }
}
