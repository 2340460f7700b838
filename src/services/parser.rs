// src/services/parser.rs

//! Markdown job table parser.
//!
//! Listing documents are maintained by hand, so the parser is tolerant:
//! rows that do not yield a company and role are dropped and counted rather
//! than reported as errors.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{JobRecord, MonthDay, ParserConfig};

/// Fewest cells a row needs: company, role, location, and at least one more.
pub const MIN_CELLS: usize = 4;

/// Records extracted from a document plus row accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub records: Vec<JobRecord>,
    /// Candidate rows that failed field extraction
    pub dropped_rows: usize,
    /// Rows skipped because they carry the closed marker
    pub closed_rows: usize,
}

/// Converts markdown table text into job records.
#[derive(Debug, Clone)]
pub struct TableParser {
    header_token: String,
    closed_marker: String,
    continuation_marker: String,
    inherit_continuation: bool,
    link_label: Regex,
    href: Regex,
    month_day: Regex,
    anchor: Selector,
}

impl TableParser {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        Ok(Self {
            header_token: config.header_token.clone(),
            closed_marker: config.closed_marker.clone(),
            continuation_marker: config.continuation_marker.clone(),
            inherit_continuation: config.inherit_continuation,
            link_label: Regex::new(r"\[([^\]]+)\]\(")?,
            href: Regex::new(r#"href="([^"]+)""#)?,
            month_day: Regex::new(
                r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s+(\d{1,2})\b",
            )?,
            anchor: parse_selector("a[href]")?,
        })
    }

    /// Parse a document into records, in document order.
    pub fn parse(&self, raw: &str) -> Vec<JobRecord> {
        self.parse_with_stats(raw).records
    }

    /// Parse a document and report how many rows were skipped.
    pub fn parse_with_stats(&self, raw: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut last_company: Option<String> = None;

        for line in raw.lines().map(str::trim) {
            if !is_candidate_row(line) || is_separator_row(line) || self.is_header_row(line) {
                continue;
            }
            if line.contains(&self.closed_marker) {
                outcome.closed_rows += 1;
                continue;
            }

            match self.parse_row(line, last_company.as_deref()) {
                Some(record) => {
                    last_company = Some(record.company.clone());
                    outcome.records.push(record);
                }
                None => outcome.dropped_rows += 1,
            }
        }

        if outcome.dropped_rows > 0 {
            log::debug!(
                "Dropped {} malformed row(s), kept {}",
                outcome.dropped_rows,
                outcome.records.len()
            );
        }
        outcome
    }

    /// A row with a cell that is exactly the company column title.
    fn is_header_row(&self, line: &str) -> bool {
        split_cells(line)
            .iter()
            .any(|cell| cell.trim() == self.header_token)
    }

    fn parse_row(&self, line: &str, last_company: Option<&str>) -> Option<JobRecord> {
        let cells = split_cells(line);
        if cells.len() < MIN_CELLS {
            return None;
        }

        let mut company = self.company_name(cells[0]);
        if self.inherit_continuation && company == self.continuation_marker {
            company = last_company?.to_string();
        }
        let role = cells[1].trim().to_string();
        if company.is_empty() || role.is_empty() {
            return None;
        }

        Some(JobRecord {
            company,
            role,
            location: cells[2].trim().to_string(),
            apply_link: cells[3..].iter().find_map(|cell| self.apply_link(cell)),
            posted_date: cells.iter().find_map(|cell| self.posted_date(cell)),
        })
    }

    /// Link label when the cell holds `[label](...)`, else the trimmed text.
    fn company_name(&self, cell: &str) -> String {
        self.link_label
            .captures(cell)
            .and_then(|caps| caps.get(1))
            .map_or(cell, |label| label.as_str())
            .trim()
            .to_string()
    }

    fn apply_link(&self, cell: &str) -> Option<String> {
        if !cell.contains("href") {
            return None;
        }
        let fragment = Html::parse_fragment(cell);
        let anchor = fragment
            .select(&self.anchor)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(str::to_string);

        // Attributes outside an anchor element.
        anchor.or_else(|| {
            self.href
                .captures_iter(cell)
                .map(|caps| caps[1].trim().to_string())
                .find(|href| !href.is_empty())
        })
    }

    /// First valid "Mon D" in the cell, normalized.
    fn posted_date(&self, cell: &str) -> Option<String> {
        self.month_day.captures_iter(cell).find_map(|caps| {
            let month = MonthDay::month_from_abbreviation(&caps[1])?;
            let day = caps[2].parse().ok()?;
            MonthDay::new(month, day).ok().map(|md| md.to_string())
        })
    }
}

/// Starts with a cell delimiter and has at least one more.
fn is_candidate_row(line: &str) -> bool {
    line.strip_prefix('|')
        .is_some_and(|rest| rest.contains('|'))
}

/// A `|---|:---:|` style alignment row.
fn is_separator_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':') || c.is_whitespace())
}

/// Cells between the outer delimiters.
fn split_cells(line: &str) -> Vec<&str> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').collect()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
# Summer 2025 Tech Internships

| Company | Role | Location | Application/Link | Date Posted |
| ------- | ---- | -------- | ---------------- | ----------- |
| **[Acme](https://simplify.jobs/c/Acme)** | Software Engineer Intern | New York, NY | <a href="https://acme.example/apply"><img src="apply.png" alt="Apply"></a> | Dec 26 |
| Globex | Quant Finance Intern | Chicago, IL | 🔒 | Dec 20 |
| Initech | Data Intern | Remote | <a href="https://initech.example/jobs/1">Apply</a> | Jan 03 |
"#;

    fn parser() -> TableParser {
        TableParser::new(&ParserConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_extracts_fields() {
        let records = parser().parse(TABLE);
        assert_eq!(records.len(), 2);

        let acme = &records[0];
        assert_eq!(acme.company, "Acme");
        assert_eq!(acme.role, "Software Engineer Intern");
        assert_eq!(acme.location, "New York, NY");
        assert_eq!(acme.apply_link.as_deref(), Some("https://acme.example/apply"));
        assert_eq!(acme.posted_date.as_deref(), Some("Dec 26"));

        let initech = &records[1];
        assert_eq!(initech.company, "Initech");
        assert_eq!(initech.posted_date.as_deref(), Some("Jan 3"));
    }

    #[test]
    fn test_header_separator_and_closed_rows_are_excluded() {
        let table = "\
| Company | Role | Location | Link |
|---|:---:|---|---|
| Globex | Analyst | NYC | 🔒 |
| Acme | SWE Intern | Remote | <a href=\"https://acme.example\">Apply</a> |";

        let outcome = parser().parse_with_stats(table);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].company, "Acme");
        assert_eq!(outcome.closed_rows, 1);
        assert_eq!(outcome.dropped_rows, 0);
    }

    #[test]
    fn test_company_name_containing_header_token_is_kept() {
        let table = "\
| Company | Role | Location | Application/Link | Date Posted |
| --- | --- | --- | --- | --- |
| [Ford Motor Company](https://simplify.jobs/c/Ford) | Software Engineer Intern | Dearborn, MI | <a href=\"https://ford.example/apply\">Apply</a> | Dec 26 |
| Acme | SWE Intern | Remote | <a href=\"https://acme.example\">Apply</a> | Dec 26 |";

        let outcome = parser().parse_with_stats(table);
        let companies: Vec<_> = outcome.records.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(companies, vec!["Ford Motor Company", "Acme"]);
        assert_eq!(outcome.dropped_rows, 0);
        assert_eq!(outcome.closed_rows, 0);
    }

    #[test]
    fn test_bare_href_attribute_is_an_apply_link() {
        let records = parser().parse(
            "| Acme | SWE | Remote | apply at href=\"https://acme.example/apply\" | Dec 26 |",
        );
        assert_eq!(
            records[0].apply_link.as_deref(),
            Some("https://acme.example/apply")
        );
    }

    #[test]
    fn test_malformed_rows_are_dropped_and_counted() {
        let table = "\
| Acme | SWE Intern | Remote |
|  | Orphan Role | Remote | x |
| Acme |   | Remote | x |
| Initech | Data Intern | Austin | x |
not a table row
|just one cell";

        let outcome = parser().parse_with_stats(table);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].company, "Initech");
        assert_eq!(outcome.dropped_rows, 3);
    }

    #[test]
    fn test_missing_link_and_date_are_none() {
        let records = parser().parse("| Acme | SWE Intern | Remote | n/a |");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].apply_link, None);
        assert_eq!(records[0].posted_date, None);
    }

    #[test]
    fn test_link_only_searched_from_fourth_cell() {
        let records = parser().parse(
            "| <a href=\"https://wrong.example\">Acme</a> | SWE | Remote | none | Feb 29 |",
        );
        assert_eq!(records[0].apply_link, None);
        assert_eq!(records[0].posted_date.as_deref(), Some("Feb 29"));
    }

    #[test]
    fn test_invalid_day_is_not_a_date() {
        let records = parser().parse("| Acme | SWE | Remote | x | Feb 31 | Mar 2 |");
        assert_eq!(records[0].posted_date.as_deref(), Some("Mar 2"));
    }

    #[test]
    fn test_document_order_preserved() {
        let table = "\
| C | first | x | y |
| A | second | x | y |
| B | third | x | y |";
        let roles: Vec<_> = parser()
            .parse(table)
            .into_iter()
            .map(|r| r.role)
            .collect();
        assert_eq!(roles, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_continuation_rows() {
        let table = "\
| Acme | SWE Intern | NYC | x |
| ↳ | PM Intern | SF | x |";

        let literal = parser().parse(table);
        assert_eq!(literal[1].company, "↳");

        let config = ParserConfig {
            inherit_continuation: true,
            ..ParserConfig::default()
        };
        let inherited = TableParser::new(&config).unwrap().parse(table);
        assert_eq!(inherited[1].company, "Acme");
        assert_eq!(inherited[1].role, "PM Intern");
    }

    #[test]
    fn test_row_predicates() {
        assert!(is_candidate_row("| a | b |"));
        assert!(!is_candidate_row("| a"));
        assert!(!is_candidate_row("a | b |"));
        assert!(is_separator_row("| --- | :---: |"));
        assert!(!is_separator_row("| - Acme - | SWE |"));
        assert_eq!(split_cells("| a | b |c"), vec![" a ", " b ", "c"]);
    }
}
