//! Assessment and levy calculations: actual value to assessed value(s), and
//! assessed value(s) plus mill levies to tax owed. Pure functions throughout.

use crate::records::{MarketRecord, PropertyClass};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no assessment rate is defined for property class \"{0}\"")]
pub struct UnknownClassification(pub String);

/// How the rate table treats a classification it has no entry for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownClassPolicy {
    /// Assess under the residential dual-rate policy, as the county's own
    /// estimator does.
    #[default]
    AssumeResidential,
    /// Refuse with [`UnknownClassification`].
    Reject,
}

/// Assessment rate policy for one classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "rate_basis", rename_all = "snake_case")]
pub enum RatePolicy {
    Single { rate: Decimal },
    Dual { local_government: Decimal, school_district: Decimal },
}

/// Classification → rate policy. Defaults to the Colorado table: Residential
/// at 6.25% (local government) / 7.05% (school district), Commercial and
/// Vacant Land at a flat 27%.
pub struct RateTable {
    policies: HashMap<PropertyClass, RatePolicy>,
    unknown: UnknownClassPolicy,
}

impl Default for RateTable {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            PropertyClass::Residential,
            RatePolicy::Dual {
                local_government: dec!(0.0625),
                school_district: dec!(0.0705),
            },
        );
        policies.insert(PropertyClass::Commercial, RatePolicy::Single { rate: dec!(0.27) });
        policies.insert(PropertyClass::VacantLand, RatePolicy::Single { rate: dec!(0.27) });
        RateTable {
            policies,
            unknown: UnknownClassPolicy::default(),
        }
    }
}

impl RateTable {
    pub fn with_unknown_policy(unknown: UnknownClassPolicy) -> Self {
        RateTable {
            unknown,
            ..RateTable::default()
        }
    }

    /// Rate policy for a classification, honoring the unknown-class policy.
    pub fn policy(&self, class: &PropertyClass) -> Result<RatePolicy, UnknownClassification> {
        if let Some(policy) = self.policies.get(class) {
            return Ok(*policy);
        }
        match self.unknown {
            UnknownClassPolicy::AssumeResidential => self
                .policies
                .get(&PropertyClass::Residential)
                .copied()
                .ok_or_else(|| UnknownClassification(class.to_string())),
            UnknownClassPolicy::Reject => Err(UnknownClassification(class.to_string())),
        }
    }
}

/// Assessed value under one rate, full precision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatedValue {
    pub rate: Decimal,
    pub assessed_value: Decimal,
}

/// Outcome of the assessment stage. Mirrors [`RatePolicy`]: one assessed
/// figure for single-rate classifications, one per taxing authority for
/// dual-rate. No rounding is applied here; the tax stage consumes the full
/// precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rate_basis", rename_all = "snake_case")]
pub enum AssessedValue {
    Single {
        actual_value: Decimal,
        rate: Decimal,
        assessed_value: Decimal,
    },
    Dual {
        actual_value: Decimal,
        local_government: RatedValue,
        school_district: RatedValue,
    },
}

/// Caller-supplied mill levies. `total_mill_levy` is authoritative when
/// present; otherwise the component sum stands in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MillLevies {
    pub local_government: Decimal,
    pub school_district: Decimal,
    pub total_mill_levy: Option<Decimal>,
}

impl MillLevies {
    pub fn total(&self) -> Decimal {
        self.total_mill_levy
            .unwrap_or(self.local_government + self.school_district)
    }
}

impl From<&MarketRecord> for MillLevies {
    fn from(market: &MarketRecord) -> Self {
        MillLevies {
            local_government: market.lg_mill_levy,
            school_district: market.school_mill_levy,
            total_mill_levy: Some(market.total_mill_levy),
        }
    }
}

/// One taxing authority's line in a dual-rate result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevyLine {
    pub assessed_value: Decimal,
    pub mill_levy: Decimal,
    pub tax: Decimal,
}

impl LevyLine {
    fn new(assessed_value: Decimal, mill_levy: Decimal) -> Self {
        LevyLine {
            assessed_value,
            mill_levy,
            tax: to_cents(assessed_value * mill_levy / dec!(1000)),
        }
    }
}

/// Outcome of the levy stage. Component taxes are rounded to whole cents;
/// the dual-rate total is the sum of the rounded components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rate_basis", rename_all = "snake_case")]
pub enum TaxResult {
    Single {
        assessed_value: Decimal,
        total_mill_levy: Decimal,
        total: Decimal,
    },
    Dual {
        local_government: LevyLine,
        school_district: LevyLine,
        total: Decimal,
    },
}

impl TaxResult {
    pub fn total(&self) -> Decimal {
        match self {
            TaxResult::Single { total, .. } | TaxResult::Dual { total, .. } => *total,
        }
    }
}

fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Stage one: actual value × assessment rate(s).
pub fn calculate_assessed_value(
    actual_value: Decimal,
    class: &PropertyClass,
    rates: &RateTable,
) -> Result<AssessedValue, UnknownClassification> {
    match rates.policy(class)? {
        RatePolicy::Single { rate } => Ok(AssessedValue::Single {
            actual_value,
            rate,
            assessed_value: actual_value * rate,
        }),
        RatePolicy::Dual {
            local_government,
            school_district,
        } => Ok(AssessedValue::Dual {
            actual_value,
            local_government: RatedValue {
                rate: local_government,
                assessed_value: actual_value * local_government,
            },
            school_district: RatedValue {
                rate: school_district,
                assessed_value: actual_value * school_district,
            },
        }),
    }
}

/// Stage two: assessed value(s) × mill levies / 1000.
pub fn calculate_taxes(assessed: &AssessedValue, levies: &MillLevies) -> TaxResult {
    match assessed {
        AssessedValue::Single { assessed_value, .. } => {
            let total_mill_levy = levies.total();
            TaxResult::Single {
                assessed_value: *assessed_value,
                total_mill_levy,
                total: to_cents(assessed_value * total_mill_levy / dec!(1000)),
            }
        }
        AssessedValue::Dual {
            local_government,
            school_district,
            ..
        } => {
            let local_government =
                LevyLine::new(local_government.assessed_value, levies.local_government);
            let school_district =
                LevyLine::new(school_district.assessed_value, levies.school_district);
            let total = local_government.tax + school_district.tax;
            TaxResult::Dual {
                local_government,
                school_district,
                total,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(actual: Decimal, class: PropertyClass) -> AssessedValue {
        calculate_assessed_value(actual, &class, &RateTable::default()).unwrap()
    }

    #[test]
    fn commercial_assessed_at_flat_rate() {
        // 2,800,000 x 0.27 = 756,000
        let assessed = assess(dec!(2800000), PropertyClass::Commercial);
        assert_eq!(
            assessed,
            AssessedValue::Single {
                actual_value: dec!(2800000),
                rate: dec!(0.27),
                assessed_value: dec!(756000.00),
            }
        );
    }

    #[test]
    fn vacant_land_shares_the_commercial_rate() {
        for value in [dec!(0), dec!(120000), dec!(98765.43)] {
            let assessed = assess(value, PropertyClass::VacantLand);
            match assessed {
                AssessedValue::Single { rate, assessed_value, .. } => {
                    assert_eq!(rate, dec!(0.27));
                    assert_eq!(assessed_value, value * dec!(0.27));
                }
                AssessedValue::Dual { .. } => panic!("vacant land is single-rate"),
            }
        }
    }

    #[test]
    fn residential_assessed_per_authority() {
        // 400,000 -> 25,000 local government, 28,200 school district
        let assessed = assess(dec!(400000), PropertyClass::Residential);
        assert_eq!(
            assessed,
            AssessedValue::Dual {
                actual_value: dec!(400000),
                local_government: RatedValue {
                    rate: dec!(0.0625),
                    assessed_value: dec!(25000.0000),
                },
                school_district: RatedValue {
                    rate: dec!(0.0705),
                    assessed_value: dec!(28200.0000),
                },
            }
        );
    }

    #[test]
    fn unknown_class_assumes_residential_by_default() {
        let mobile = PropertyClass::Other("Mobile Home".to_string());
        let assessed = assess(dec!(200000), mobile);
        match assessed {
            AssessedValue::Dual { local_government, .. } => {
                assert_eq!(local_government.assessed_value, dec!(12500.0000));
            }
            AssessedValue::Single { .. } => panic!("fallback policy is dual-rate"),
        }
    }

    #[test]
    fn unknown_class_rejected_under_strict_policy() {
        let rates = RateTable::with_unknown_policy(UnknownClassPolicy::Reject);
        let mobile = PropertyClass::Other("Mobile Home".to_string());
        let err = calculate_assessed_value(dec!(200000), &mobile, &rates).unwrap_err();
        assert_eq!(err, UnknownClassification("Mobile Home".to_string()));
        // Known classes are unaffected by the policy.
        assert!(calculate_assessed_value(dec!(200000), &PropertyClass::Commercial, &rates).is_ok());
    }

    #[test]
    fn single_rate_tax_uses_total_levy() {
        // 756,000 x 85.432 / 1000 = 64,586.592 -> 64,586.59
        let assessed = assess(dec!(2800000), PropertyClass::Commercial);
        let levies = MillLevies {
            local_government: dec!(0),
            school_district: dec!(0),
            total_mill_levy: Some(dec!(85.432)),
        };
        let taxes = calculate_taxes(&assessed, &levies);
        assert_eq!(
            taxes,
            TaxResult::Single {
                assessed_value: dec!(756000.00),
                total_mill_levy: dec!(85.432),
                total: dec!(64586.59),
            }
        );
    }

    #[test]
    fn single_rate_tax_sums_components_when_total_absent() {
        let assessed = assess(dec!(2800000), PropertyClass::Commercial);
        let levies = MillLevies {
            local_government: dec!(40.0),
            school_district: dec!(45.432),
            total_mill_levy: None,
        };
        let taxes = calculate_taxes(&assessed, &levies);
        match taxes {
            TaxResult::Single { total_mill_levy, total, .. } => {
                assert_eq!(total_mill_levy, dec!(85.432));
                assert_eq!(total, dec!(64586.59));
            }
            TaxResult::Dual { .. } => panic!("commercial is single-rate"),
        }
    }

    #[test]
    fn dual_rate_tax_per_authority() {
        // 25,000 x 32.1 / 1000 = 802.50; 28,200 x 52.9 / 1000 = 1,491.78
        let assessed = assess(dec!(400000), PropertyClass::Residential);
        let levies = MillLevies {
            local_government: dec!(32.1),
            school_district: dec!(52.9),
            total_mill_levy: None,
        };
        let taxes = calculate_taxes(&assessed, &levies);
        match taxes {
            TaxResult::Dual {
                local_government,
                school_district,
                total,
            } => {
                assert_eq!(local_government.tax, dec!(802.50));
                assert_eq!(school_district.tax, dec!(1491.78));
                assert_eq!(total, dec!(2294.28));
            }
            TaxResult::Single { .. } => panic!("residential is dual-rate"),
        }
    }

    #[test]
    fn dual_rate_ignores_stated_total_levy() {
        // The combined figure only matters on the single-rate path.
        let assessed = assess(dec!(400000), PropertyClass::Residential);
        let levies = MillLevies {
            local_government: dec!(32.1),
            school_district: dec!(52.9),
            total_mill_levy: Some(dec!(999.9)),
        };
        assert_eq!(calculate_taxes(&assessed, &levies).total(), dec!(2294.28));
    }

    #[test]
    fn calculations_are_idempotent() {
        let class = PropertyClass::Residential;
        let rates = RateTable::default();
        let levies = MillLevies {
            local_government: dec!(32.1),
            school_district: dec!(52.9),
            total_mill_levy: Some(dec!(85.0)),
        };
        let first = calculate_assessed_value(dec!(123456.78), &class, &rates).unwrap();
        let second = calculate_assessed_value(dec!(123456.78), &class, &rates).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            calculate_taxes(&first, &levies),
            calculate_taxes(&second, &levies)
        );
    }

    #[test]
    fn zero_actual_value_assesses_to_zero() {
        let assessed = assess(dec!(0), PropertyClass::Residential);
        let levies = MillLevies {
            local_government: dec!(32.1),
            school_district: dec!(52.9),
            total_mill_levy: None,
        };
        assert_eq!(calculate_taxes(&assessed, &levies).total(), dec!(0.00));
    }

    #[test]
    fn rate_table_policy_surface() {
        let rates = RateTable::default();
        assert_eq!(
            rates.policy(&PropertyClass::Commercial).unwrap(),
            RatePolicy::Single { rate: dec!(0.27) }
        );
        assert_eq!(
            rates.policy(&PropertyClass::Other("Condo".to_string())).unwrap(),
            rates.policy(&PropertyClass::Residential).unwrap()
        );
    }
}
