use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use super::GridError;

pub const US_PER_MS: i64 = 1_000;
pub const US_PER_SECOND: i64 = 1_000_000;
pub const US_PER_MINUTE: i64 = 60 * US_PER_SECOND;
pub const US_PER_HOUR: i64 = 60 * US_PER_MINUTE;
pub const US_PER_DAY: i64 = 24 * US_PER_HOUR;

/// Calendar units, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl TimeUnit {
    /// Fixed length of the unit, for units that have one.
    pub fn fixed_us(self) -> Option<i64> {
        match self {
            Self::Microsecond => Some(1),
            Self::Millisecond => Some(US_PER_MS),
            Self::Second => Some(US_PER_SECOND),
            Self::Minute => Some(US_PER_MINUTE),
            Self::Hour => Some(US_PER_HOUR),
            Self::Day | Self::Month | Self::Year => None,
        }
    }
}

/// One row of the unit table: a unit, the shortest real length it can have,
/// the multipliers the planner may step by, and its label format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub unit: TimeUnit,
    /// Shortest wall-clock length of one unit (a DST day is 23h).
    pub min_duration_us: i64,
    /// Allowed "nice" multipliers, ascending.
    pub intervals: Vec<u32>,
    /// strftime-style label format.
    pub format: String,
}

impl UnitSpec {
    fn new(unit: TimeUnit, min_duration_us: i64, intervals: &[u32], format: &str) -> Self {
        Self {
            unit,
            min_duration_us,
            intervals: intervals.to_vec(),
            format: format.to_string(),
        }
    }
}

/// Ordered unit table, smallest unit first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitTable(Vec<UnitSpec>);

impl UnitTable {
    pub fn new(units: Vec<UnitSpec>) -> Result<Self, GridError> {
        let table = Self(units);
        table.validate()?;
        Ok(table)
    }

    pub fn units(&self) -> &[UnitSpec] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&UnitSpec> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.0.is_empty() {
            return Err(GridError::InvalidTable("unit table is empty".into()));
        }
        for pair in self.0.windows(2) {
            if pair[1].unit <= pair[0].unit || pair[1].min_duration_us < pair[0].min_duration_us {
                return Err(GridError::InvalidTable(format!(
                    "{:?} must come after {:?}",
                    pair[0].unit, pair[1].unit
                )));
            }
        }
        for spec in &self.0 {
            if spec.min_duration_us <= 0 {
                return Err(GridError::InvalidTable(format!(
                    "{:?} has a non-positive duration",
                    spec.unit
                )));
            }
            if spec.intervals.is_empty()
                || spec.intervals.contains(&0)
                || spec.intervals.windows(2).any(|w| w[1] <= w[0])
            {
                return Err(GridError::InvalidTable(format!(
                    "{:?} intervals must be positive and ascending",
                    spec.unit
                )));
            }
            if StrftimeItems::new(&spec.format).any(|item| matches!(item, Item::Error)) {
                return Err(GridError::InvalidTable(format!(
                    "{:?} has an invalid label format {:?}",
                    spec.unit, spec.format
                )));
            }
        }
        Ok(())
    }
}

impl Default for UnitTable {
    /// Microseconds through years. The millisecond row runs up to 1000 so a
    /// window of a few seconds on a narrow surface still steps in
    /// milliseconds.
    fn default() -> Self {
        use TimeUnit::*;
        Self(vec![
            UnitSpec::new(
                Microsecond,
                1,
                &[1, 2, 5, 10, 20, 50, 100, 200, 500],
                "%H:%M:%S%.6f",
            ),
            UnitSpec::new(
                Millisecond,
                US_PER_MS,
                &[1, 2, 5, 10, 20, 50, 100, 200, 500, 1000],
                "%H:%M:%S%.3f",
            ),
            UnitSpec::new(Second, US_PER_SECOND, &[1, 2, 5, 10, 15, 30], "%H:%M:%S"),
            UnitSpec::new(Minute, US_PER_MINUTE, &[1, 2, 5, 10, 15, 30], "%H:%M"),
            UnitSpec::new(Hour, US_PER_HOUR, &[1, 2, 3, 6, 12], "%H:%M"),
            UnitSpec::new(Day, 23 * US_PER_HOUR, &[1, 2, 5, 10], "%b %d"),
            UnitSpec::new(Month, 28 * US_PER_DAY - US_PER_HOUR, &[1, 2, 3, 6], "%b"),
            UnitSpec::new(
                Year,
                365 * US_PER_DAY - US_PER_HOUR,
                &[1, 2, 5, 10, 20, 50, 100, 200, 500, 1000],
                "%Y",
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let table = UnitTable::default();
        assert_eq!(table.validate(), Ok(()));
        assert_eq!(table.len(), 8);
        assert_eq!(table.get(0).map(|u| u.unit), Some(TimeUnit::Microsecond));
    }

    #[test]
    fn rejects_unordered_units() {
        let mut units = UnitTable::default().units().to_vec();
        units.swap(2, 3);
        assert!(matches!(UnitTable::new(units), Err(GridError::InvalidTable(_))));
    }

    #[test]
    fn rejects_bad_intervals_and_formats() {
        let mut units = UnitTable::default().units().to_vec();
        units[0].intervals = vec![2, 1];
        assert!(UnitTable::new(units).is_err());

        let mut units = UnitTable::default().units().to_vec();
        units[4].format = "%H:%".to_string();
        assert!(UnitTable::new(units).is_err());
    }

    #[test]
    fn deserializes_from_json_rows() {
        let json = r#"[
            {"unit": "second", "min_duration_us": 1000000, "intervals": [1, 5], "format": "%S"},
            {"unit": "minute", "min_duration_us": 60000000, "intervals": [1], "format": "%M"}
        ]"#;
        let table: Option<UnitTable> = serde_json::from_str(json).ok();
        assert_eq!(table.map(|t| t.validate().is_ok()), Some(true));
    }
}
