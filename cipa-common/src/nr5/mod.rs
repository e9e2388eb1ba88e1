//! NR-5 committee dimensioning
//!
//! Pure function of (CNAE, headcount). The regulatory data lives in two
//! declarative tables: [`groups::NR5_GROUPS`] maps CNAE divisions to risk
//! groups and [`bands`] maps headcount bands to seat counts.

pub mod bands;
pub mod groups;

pub use bands::{BandSet, SeatBand, MIN_EMPLOYEES_FOR_COMMITTEE};
pub use groups::{cnae_division, group_by_code, group_for_cnae, Nr5Group, NR5_GROUPS};

use serde::Serialize;

/// Required committee size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensioning {
    /// Matched risk group, `None` when the CNAE is not covered
    pub group: Option<&'static Nr5Group>,
    pub employees: u32,
    pub efetivos: u32,
    pub suplentes: u32,
    /// No committee required: a single designated officer suffices
    pub designated: bool,
}

/// Dimension a committee from a CNAE code and an employee count
pub fn dimension(cnae: &str, employees: u32) -> Dimensioning {
    dimension_group(group_for_cnae(cnae), employees)
}

/// Dimension a committee for an already resolved group
pub fn dimension_group(group: Option<&'static Nr5Group>, employees: u32) -> Dimensioning {
    let (efetivos, suplentes) = group
        .map(|g| g.bands.seats(employees))
        .unwrap_or((0, 0));

    Dimensioning {
        group,
        employees,
        efetivos,
        suplentes,
        designated: efetivos == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_cnae_is_designated() {
        let result = dimension("0111-3/01", 500);
        assert!(result.group.is_none());
        assert_eq!((result.efetivos, result.suplentes), (0, 0));
        assert!(result.designated);
    }

    #[test]
    fn test_retail_store() {
        let result = dimension("4711-0/01", 45);
        assert_eq!(result.group.map(|g| g.code), Some("C-24"));
        assert_eq!((result.efetivos, result.suplentes), (1, 1));
        assert!(!result.designated);
    }

    #[test]
    fn test_dimension_is_deterministic() {
        assert_eq!(dimension("4711-0/01", 45), dimension("4711-0/01", 45));
    }

    #[test]
    fn test_below_twenty_is_zero_for_every_group() {
        for group in NR5_GROUPS {
            for employees in 0..MIN_EMPLOYEES_FOR_COMMITTEE {
                let result = dimension_group(Some(group), employees);
                assert_eq!((result.efetivos, result.suplentes), (0, 0), "{}", group.code);
                assert!(result.designated);
            }
        }
    }

    #[test]
    fn test_efetivos_monotonic_per_group() {
        for group in NR5_GROUPS {
            let mut previous = 0;
            for employees in 0..=400 {
                let efetivos = dimension_group(Some(group), employees).efetivos;
                assert!(
                    efetivos >= previous,
                    "{} decreased at {} employees",
                    group.code,
                    employees
                );
                previous = efetivos;
            }
        }
    }
}
