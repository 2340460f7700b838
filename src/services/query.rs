//! Record filtering by posting day and category keyword.

use crate::error::{AppError, Result};
use crate::models::{JobRecord, MonthDay};

/// Keep records posted on `target`, ignoring the year.
///
/// Records whose date is missing or unparsable never match.
pub fn filter_by_date(records: &[JobRecord], target: MonthDay) -> Vec<JobRecord> {
    records
        .iter()
        .filter(|r| r.posted_on() == Some(target))
        .cloned()
        .collect()
}

/// Keep records whose company, role or location mention `keyword`,
/// ignoring case.
pub fn filter_by_category(records: &[JobRecord], keyword: &str) -> Vec<JobRecord> {
    let needle = keyword.to_lowercase();
    records
        .iter()
        .filter(|r| r.row_text().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Validated combination of optional filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub date: Option<MonthDay>,
    pub category: Option<String>,
}

impl RecordQuery {
    /// Build a query from caller input, e.g. `("Dec 26", "finance")`.
    pub fn parse(date: Option<&str>, category: Option<&str>) -> Result<Self> {
        let date = date.map(str::parse::<MonthDay>).transpose()?;
        let category = category
            .map(|c| {
                let c = c.trim();
                if c.is_empty() {
                    Err(AppError::validation("Category filter is empty"))
                } else {
                    Ok(c.to_string())
                }
            })
            .transpose()?;
        Ok(Self { date, category })
    }

    pub fn apply(&self, records: &[JobRecord]) -> Vec<JobRecord> {
        let by_date = match self.date {
            Some(target) => filter_by_date(records, target),
            None => records.to_vec(),
        };
        match &self.category {
            Some(keyword) => filter_by_category(&by_date, keyword),
            None => by_date,
        }
    }
}
