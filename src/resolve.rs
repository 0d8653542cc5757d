//! Property resolver: turns an account number or address fragment into a
//! single canonical property view.

use crate::records::{AddressRecord, MarketRecord, SeniorRecord};
use crate::store::{normalize_account, ReferenceStore};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("reference data is not loaded")]
    NotReady,
    #[error("no property matches that account number or address")]
    NotFound,
}

/// A property with both its address and market records in hand. An account
/// with only one of the two is treated as not found.
#[derive(Debug, Clone)]
pub struct ResolvedProperty {
    pub account_number: String,
    pub address: AddressRecord,
    pub market: MarketRecord,
    pub senior: Option<SeniorRecord>,
    pub has_adjustment: bool,
}

impl ResolvedProperty {
    pub fn has_senior_exemption(&self) -> bool {
        self.senior.is_some()
    }
}

/// Outcome of an address-fragment resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The query narrowed to one property, resolved in full.
    Property(ResolvedProperty),
    /// Two or more candidates, in search order; nothing was resolved.
    Candidates(Vec<AddressRecord>),
}

pub struct PropertyResolver<'a> {
    store: &'a ReferenceStore,
    current: Option<ResolvedProperty>,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(store: &'a ReferenceStore) -> Self {
        PropertyResolver { store, current: None }
    }

    /// Resolve by account number, insensitive to case and surrounding
    /// whitespace. Overwrites the current property on success only.
    pub fn resolve_by_account(&mut self, account: &str) -> Result<ResolvedProperty, LookupError> {
        if !self.store.is_ready() {
            return Err(LookupError::NotReady);
        }
        let account = normalize_account(account);
        log::debug!("resolving account {account}");

        let address = self.store.address(&account).ok_or(LookupError::NotFound)?;
        let market = self.store.market(&account).ok_or(LookupError::NotFound)?;
        let resolved = ResolvedProperty {
            address: address.clone(),
            market: market.clone(),
            senior: self.store.senior(&account).cloned(),
            has_adjustment: self.store.has_adjustment(&account),
            account_number: account,
        };
        self.current = Some(resolved.clone());
        Ok(resolved)
    }

    /// Resolve by address fragment. Zero matches is `NotFound`; a single
    /// match auto-resolves through [`resolve_by_account`](Self::resolve_by_account);
    /// more than one comes back as candidates for the caller to disambiguate.
    pub fn resolve_by_address(&mut self, query: &str) -> Result<Resolution, LookupError> {
        if !self.store.is_ready() {
            return Err(LookupError::NotReady);
        }
        let matches = self.store.search_by_site_address(query);
        log::debug!("address query {query:?} matched {} record(s)", matches.len());
        match matches.len() {
            0 => Err(LookupError::NotFound),
            1 => {
                let account = matches[0].account_number.clone();
                self.resolve_by_account(&account).map(Resolution::Property)
            }
            _ => Ok(Resolution::Candidates(matches.into_iter().cloned().collect())),
        }
    }

    /// The last successfully resolved property. Failed attempts leave it
    /// untouched.
    #[allow(dead_code)]
    pub fn current(&self) -> Option<&ResolvedProperty> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AdjustmentRecord, PropertyClass};
    use crate::store::DatasetBundle;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn address(account: &str, site: &str) -> AddressRecord {
        AddressRecord {
            account_number: account.to_string(),
            parcel_number: "4575-21-3-08-004".to_string(),
            property_type: PropertyClass::Residential,
            economic_area: None,
            site_address: site.to_string(),
        }
    }

    fn market(account: &str, actual: Decimal) -> MarketRecord {
        MarketRecord {
            account_number: account.to_string(),
            parcel_number: "4575-21-3-08-004".to_string(),
            total_actual_value: actual,
            total_assessed_precalc: None,
            alt_assessed_precalc: None,
            lg_mill_levy: dec!(32.1),
            school_mill_levy: dec!(52.9),
            total_mill_levy: dec!(85.0),
            tax_district: "572".to_string(),
            tax_year: 2025,
        }
    }

    fn loaded_store() -> ReferenceStore {
        let mut store = ReferenceStore::new();
        store
            .load(DatasetBundle {
                addresses: vec![
                    address("R0604049", "123 MAIN ST"),
                    address("R0604050", "123 MAINWOOD AVE"),
                    address("C0031882", "4800 COMMERCE WAY"),
                    address("R0999999", "77 ORPHAN LN"),
                ],
                market: vec![
                    market("R0604049", dec!(400000)),
                    market("R0604050", dec!(385000)),
                    market("C0031882", dec!(2800000)),
                ],
                seniors: vec![SeniorRecord {
                    account_number: "R0604049".to_string(),
                    exempt_actual_value: Some(dec!(100000)),
                    taxes_exempted: Some(dec!(748.25)),
                }],
                adjustments: vec![AdjustmentRecord {
                    account_number: "C0031882".to_string(),
                }],
            })
            .unwrap();
        store
    }

    #[test]
    fn resolve_by_account_ignores_case_and_whitespace() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);

        for input in ["R0604049", "r0604049 ", " R0604049"] {
            let resolved = resolver.resolve_by_account(input).unwrap();
            assert_eq!(resolved.account_number, "R0604049");
            assert_eq!(resolved.market.total_actual_value, dec!(400000));
        }
    }

    #[test]
    fn resolve_carries_flags_and_senior_amounts() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);

        let senior = resolver.resolve_by_account("R0604049").unwrap();
        assert!(senior.has_senior_exemption());
        assert!(!senior.has_adjustment);
        assert_eq!(
            senior.senior.as_ref().and_then(|s| s.exempt_actual_value),
            Some(dec!(100000))
        );

        let commercial = resolver.resolve_by_account("C0031882").unwrap();
        assert!(!commercial.has_senior_exemption());
        assert!(commercial.has_adjustment);
    }

    #[test]
    fn account_with_address_but_no_market_is_not_found() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);
        assert_eq!(
            resolver.resolve_by_account("R0999999").unwrap_err(),
            LookupError::NotFound
        );
    }

    #[test]
    fn not_ready_store_refuses_resolution() {
        let store = ReferenceStore::new();
        let mut resolver = PropertyResolver::new(&store);
        assert_eq!(
            resolver.resolve_by_account("R0604049").unwrap_err(),
            LookupError::NotReady
        );
        assert_eq!(
            resolver.resolve_by_address("123 MAIN").unwrap_err(),
            LookupError::NotReady
        );
    }

    #[test]
    fn single_address_match_auto_resolves() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);

        match resolver.resolve_by_address("COMMERCE").unwrap() {
            Resolution::Property(p) => assert_eq!(p.account_number, "C0031882"),
            Resolution::Candidates(_) => panic!("expected auto-resolution"),
        }
        assert_eq!(resolver.current().unwrap().account_number, "C0031882");
    }

    #[test]
    fn multiple_matches_return_candidates_without_resolving() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);

        match resolver.resolve_by_address("123 Main").unwrap() {
            Resolution::Candidates(candidates) => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(candidates[0].account_number, "R0604049");
                assert_eq!(candidates[1].account_number, "R0604050");
            }
            Resolution::Property(_) => panic!("expected candidates"),
        }
        assert!(resolver.current().is_none());
    }

    #[test]
    fn no_match_is_not_found() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);
        assert_eq!(
            resolver.resolve_by_address("ZZ TOP RD").unwrap_err(),
            LookupError::NotFound
        );
    }

    #[test]
    fn failed_resolution_keeps_current_property() {
        let store = loaded_store();
        let mut resolver = PropertyResolver::new(&store);

        resolver.resolve_by_account("R0604049").unwrap();
        assert!(resolver.resolve_by_account("NOPE-1").is_err());
        assert!(resolver.resolve_by_address("123 Main").is_ok_and(|r| matches!(
            r,
            Resolution::Candidates(_)
        )));

        assert_eq!(resolver.current().unwrap().account_number, "R0604049");
    }
}
