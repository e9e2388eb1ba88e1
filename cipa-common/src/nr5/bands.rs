//! Seat band tables
//!
//! A band covers employee counts up to and including `max_employees`
//! (`None` = unbounded). Bands are listed in ascending order; the first band
//! whose upper bound admits the count wins.

use serde::Serialize;

/// Committee seats required for one employee-count band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatBand {
    pub max_employees: Option<u32>,
    pub efetivos: u32,
    pub suplentes: u32,
}

const fn band(max_employees: Option<u32>, efetivos: u32, suplentes: u32) -> SeatBand {
    SeatBand { max_employees, efetivos, suplentes }
}

/// No group may require a committee below this headcount
pub const MIN_EMPLOYEES_FOR_COMMITTEE: u32 = 20;

const STANDARD_INDUSTRIAL: &[SeatBand] = &[
    band(Some(19), 0, 0),
    band(Some(29), 1, 1),
    band(Some(50), 2, 2),
    band(Some(80), 3, 3),
    band(Some(100), 4, 3),
    band(None, 4, 4),
];

const LOW_RISK_COMMERCIAL: &[SeatBand] = &[
    band(Some(29), 0, 0),
    band(Some(50), 1, 1),
    band(Some(80), 1, 1),
    band(Some(100), 2, 2),
    band(None, 3, 3),
];

const GENERIC: &[SeatBand] = &[
    band(Some(19), 0, 0),
    band(Some(50), 1, 1),
    band(None, 2, 2),
];

/// Band set applied to a risk group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSet {
    StandardIndustrial,
    LowRiskCommercial,
    Generic,
}

impl BandSet {
    pub fn bands(&self) -> &'static [SeatBand] {
        match self {
            BandSet::StandardIndustrial => STANDARD_INDUSTRIAL,
            BandSet::LowRiskCommercial => LOW_RISK_COMMERCIAL,
            BandSet::Generic => GENERIC,
        }
    }

    /// (efetivos, suplentes) for a headcount
    pub fn seats(&self, employees: u32) -> (u32, u32) {
        if employees < MIN_EMPLOYEES_FOR_COMMITTEE {
            return (0, 0);
        }
        self.bands()
            .iter()
            .find(|b| b.max_employees.map_or(true, |max| employees <= max))
            .map(|b| (b.efetivos, b.suplentes))
            .unwrap_or((0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_industrial_thresholds() {
        let s = BandSet::StandardIndustrial;
        assert_eq!(s.seats(19), (0, 0));
        assert_eq!(s.seats(20), (1, 1));
        assert_eq!(s.seats(29), (1, 1));
        assert_eq!(s.seats(30), (2, 2));
        assert_eq!(s.seats(50), (2, 2));
        assert_eq!(s.seats(51), (3, 3));
        assert_eq!(s.seats(80), (3, 3));
        assert_eq!(s.seats(81), (4, 3));
        assert_eq!(s.seats(100), (4, 3));
        assert_eq!(s.seats(101), (4, 4));
        assert_eq!(s.seats(5000), (4, 4));
    }

    #[test]
    fn test_low_risk_commercial_thresholds() {
        let s = BandSet::LowRiskCommercial;
        assert_eq!(s.seats(25), (0, 0));
        assert_eq!(s.seats(29), (0, 0));
        assert_eq!(s.seats(30), (1, 1));
        assert_eq!(s.seats(80), (1, 1));
        assert_eq!(s.seats(81), (2, 2));
        assert_eq!(s.seats(100), (2, 2));
        assert_eq!(s.seats(101), (3, 3));
    }

    #[test]
    fn test_generic_thresholds() {
        let s = BandSet::Generic;
        assert_eq!(s.seats(0), (0, 0));
        assert_eq!(s.seats(19), (0, 0));
        assert_eq!(s.seats(20), (1, 1));
        assert_eq!(s.seats(50), (1, 1));
        assert_eq!(s.seats(51), (2, 2));
    }

    #[test]
    fn test_bands_are_ascending_and_end_unbounded() {
        for set in [BandSet::StandardIndustrial, BandSet::LowRiskCommercial, BandSet::Generic] {
            let bands = set.bands();
            assert!(bands.last().unwrap().max_employees.is_none());
            let bounds: Vec<u32> = bands.iter().filter_map(|b| b.max_employees).collect();
            assert!(bounds.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
