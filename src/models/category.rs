//! Job categories subscribers can follow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Fixed set of job categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Swe,
    Finance,
}

impl JobCategory {
    pub const ALL: [JobCategory; 2] = [JobCategory::Swe, JobCategory::Finance];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            JobCategory::Swe => "SWE",
            JobCategory::Finance => "Finance",
        }
    }

    /// Reaction glyph that selects this category.
    pub fn glyph(&self) -> &'static str {
        match self {
            JobCategory::Swe => "💻",
            JobCategory::Finance => "💵",
        }
    }

    /// Keyword whose presence in a document signals this category.
    pub fn keyword(&self) -> &'static str {
        match self {
            JobCategory::Swe => "swe",
            JobCategory::Finance => "finance",
        }
    }

    pub fn from_glyph(glyph: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.glyph() == glyph)
    }

    /// Categories whose keyword occurs in `content`, ignoring case.
    pub fn detect_in(content: &str) -> Vec<Self> {
        let lower = content.to_lowercase();
        Self::ALL
            .into_iter()
            .filter(|c| lower.contains(c.keyword()))
            .collect()
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for JobCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::from_glyph(s)
            .or_else(|| Self::ALL.into_iter().find(|c| c.label().eq_ignore_ascii_case(s)))
            .ok_or_else(|| AppError::validation(format!("Unknown job category '{s}'")))
    }
}
