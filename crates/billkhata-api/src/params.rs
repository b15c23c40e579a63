// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    /// Parses `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (year_raw, month_raw) = raw
            .split_once('-')
            .ok_or_else(|| "month must be in YYYY-MM form".to_string())?;
        if year_raw.len() != 4 || month_raw.len() != 2 {
            return Err("month must be in YYYY-MM form".to_string());
        }
        let year: i32 = year_raw
            .parse()
            .map_err(|_| "month year must be an integer".to_string())?;
        let month: u32 = month_raw
            .parse()
            .map_err(|_| "month must be an integer".to_string())?;
        if !(1..=12).contains(&month) {
            return Err("month must be between 01 and 12".to_string());
        }
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        date.year() == self.year && date.month() == self.month
    }

    #[must_use]
    pub fn canonical_string(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| "date must be YYYY-MM-DD".to_string())
}

/// `month` query parameter, when present.
pub fn month_param(params: &HashMap<String, String>) -> Result<Option<Month>, String> {
    params.get("month").map(|raw| Month::parse(raw)).transpose()
}

pub fn bool_param(params: &HashMap<String, String>, name: &str) -> bool {
    params
        .get(name)
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// `limit` query parameter clamped to `max`, defaulting to `max`.
pub fn limit_param(params: &HashMap<String, String>, max: usize) -> Result<usize, String> {
    match params.get("limit") {
        None => Ok(max),
        Some(raw) => {
            let limit: usize = raw
                .parse()
                .map_err(|_| "limit must be a non-negative integer".to_string())?;
            Ok(limit.min(max))
        }
    }
}
