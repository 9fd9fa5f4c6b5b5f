use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An inclusive date range used by analytics and dashboard queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// A range is valid when it does not end before it starts.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let range = DateRange::new(d(2024, 3, 1), d(2024, 3, 31));
        assert!(range.contains(d(2024, 3, 1)));
        assert!(range.contains(d(2024, 3, 31)));
        assert!(!range.contains(d(2024, 4, 1)));
        assert!(!range.contains(d(2024, 2, 29)));
    }

    #[test]
    fn inverted_range_is_invalid() {
        assert!(!DateRange::new(d(2024, 3, 31), d(2024, 3, 1)).is_valid());
        assert!(DateRange::new(d(2024, 3, 1), d(2024, 3, 1)).is_valid());
    }
}
