use std::collections::BTreeMap;

use time::macros::format_description;
use time::Date;

/// Errors raised while turning raw provider data into typed counts.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid contribution date {value:?}: expected YYYY-MM-DD")]
    InvalidDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<Date, CoreError> {
    Date::parse(value, format_description!("[year]-[month]-[day]")).map_err(|source| {
        CoreError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

/// Daily activity counts keyed by calendar date.
///
/// Backed by a `BTreeMap`, so iteration is always ascending by date no matter
/// what order the provider returned entries in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionCounts {
    days: BTreeMap<Date, u64>,
}

impl ContributionCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(date, count)` pairs. A repeated date keeps the last count.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut days = BTreeMap::new();
        for (date, count) in entries {
            days.insert(parse_date(date)?, count);
        }
        Ok(Self { days })
    }

    pub fn insert(&mut self, date: Date, count: u64) {
        self.days.insert(date, count);
    }

    /// Count recorded for `date`, or 0 when the date is absent.
    pub fn get(&self, date: Date) -> u64 {
        self.days.get(&date).copied().unwrap_or(0)
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Date, u64)> + '_ {
        self.days.iter().map(|(d, c)| (*d, *c))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<(Date, u64)> for ContributionCounts {
    fn from_iter<T: IntoIterator<Item = (Date, u64)>>(iter: T) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}
