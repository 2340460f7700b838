//! Job posting data structures.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Three-letter month abbreviations, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One row of a job listing table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    /// Company name (link label when the cell holds a markdown link)
    pub company: String,

    /// Role title
    pub role: String,

    /// Location text as written in the table
    pub location: String,

    /// Application URL, when the row embeds one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_link: Option<String>,

    /// Posting date as "Mon D", without a year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
}

impl JobRecord {
    /// Identity used for deduplication.
    pub fn key(&self) -> JobKey {
        JobKey::new(&self.company, &self.role)
    }

    /// Posting date parsed into a month and day.
    pub fn posted_on(&self) -> Option<MonthDay> {
        self.posted_date.as_deref().and_then(|d| d.parse().ok())
    }

    /// Company, role and location joined for coarse text matching.
    pub fn row_text(&self) -> String {
        format!("{} {} {}", self.company, self.role, self.location)
    }
}

/// Composite identity of a posting.
///
/// No stable id exists upstream, so two records with the same company and
/// role are the same posting regardless of their other fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobKey {
    pub company: String,
    pub role: String,
}

impl JobKey {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            role: role.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.company, self.role)
    }
}

/// Calendar day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Build a month/day pair, rejecting days that never occur in `month`.
    pub fn new(month: u32, day: u32) -> Result<Self> {
        // 2000 is a leap year, so Feb 29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day)
            .map(|_| Self { month, day })
            .ok_or_else(|| AppError::validation(format!("No such date: month {month}, day {day}")))
    }

    /// Today's month and day in local time.
    pub fn today() -> Self {
        use chrono::Datelike;
        let now = chrono::Local::now().date_naive();
        Self {
            month: now.month(),
            day: now.day(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Month number (1-12) for a three-letter abbreviation, ignoring case.
    pub fn month_from_abbreviation(abbr: &str) -> Option<u32> {
        MONTH_ABBREVIATIONS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(abbr))
            .map(|i| i as u32 + 1)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", MONTH_ABBREVIATIONS[self.month as usize - 1], self.day)
    }
}

impl FromStr for MonthDay {
    type Err = AppError;

    /// Parse "Dec 26". Anything after the day (a year, say) is ignored.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AppError::validation(format!("Invalid date '{s}', expected e.g. \"Dec 26\""));

        let mut parts = s.split_whitespace();
        let month_part = parts.next().ok_or_else(invalid)?;
        let day_part = parts.next().ok_or_else(invalid)?;

        if month_part.len() != 3 {
            return Err(invalid());
        }
        let month = Self::month_from_abbreviation(month_part).ok_or_else(invalid)?;
        let day: u32 = day_part
            .trim_end_matches(',')
            .parse()
            .map_err(|_| invalid())?;

        Self::new(month, day)
    }
}
