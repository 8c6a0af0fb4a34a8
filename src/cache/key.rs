//! Cache key for a single day's menu at one location

use std::fmt;

use chrono::NaiveDate;

/// Identifies one cached menu: a calendar date and a location registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    date: NaiveDate,
    location: String,
}

impl CacheKey {
    pub fn new(date: NaiveDate, location: impl Into<String>) -> Self {
        Self {
            date,
            location: location.into(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// File stem used on disk, e.g. `2024-03-07_Stwest`
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.date.format("%Y-%m-%d"), self.location)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.location, self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_uses_iso_date_then_location() {
        let key = CacheKey::new(NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(), "Stwest");
        assert_eq!(key.file_stem(), "2024-03-07_Stwest");
    }

    #[test]
    fn test_keys_differ_by_date_and_location() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let a = CacheKey::new(day, "Stwest");
        let b = CacheKey::new(day, "Steast");
        let c = CacheKey::new(day.succ_opt().unwrap(), "Stwest");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.file_stem(), b.file_stem());
        assert_ne!(a.file_stem(), c.file_stem());
    }

    #[test]
    fn test_display_is_human_readable() {
        let key = CacheKey::new(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(), "IV");
        assert_eq!(key.to_string(), "IV on 2023-12-31");
    }
}
