//! Filter criteria for command records.
//!
//! Built from request query parameters; validated before any backend is touched.

use crate::core::{Error, OrgId, Result, Scope, Timestamp};
use crate::storage::record::CommandRecord;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw query parameters as received from the boundary layer.
pub type FilterParams = HashMap<String, String>;

/// Filter for command records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandFilter {
    /// Restrict to one organization
    pub org_id: Option<OrgId>,
    /// Exact user
    pub user: Option<String>,
    /// Exact asset
    pub asset: Option<String>,
    /// Exact account
    pub account: Option<String>,
    /// Exact session
    pub session: Option<String>,
    /// Substring of the command line
    pub input: Option<String>,
    /// Exact risk level
    pub risk_level: Option<u8>,
    /// Inclusive lower bound
    pub date_from: Option<Timestamp>,
    /// Inclusive upper bound
    pub date_to: Option<Timestamp>,
}

impl CommandFilter {
    /// Create an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate query parameters.
    ///
    /// Unknown keys are ignored. Empty values count as absent.
    pub fn from_params(params: &FilterParams) -> Result<Self> {
        let get = |key: &str| param(params, key);

        let mut filter = Self::new();
        filter.user = get("user").map(str::to_string);
        filter.asset = get("asset").map(str::to_string);
        filter.account = get("account")
            .or_else(|| get("system_user"))
            .map(str::to_string);
        filter.session = get("session").map(str::to_string);
        filter.input = get("input").map(str::to_string);
        filter.org_id = get("org_id").map(OrgId::new);

        if let Some(raw) = get("risk_level") {
            let level: u8 = raw
                .parse()
                .map_err(|_| Error::invalid_filter("risk_level", format!("`{}` is not a number", raw)))?;
            filter.risk_level = Some(level);
        }

        if let Some(raw) = get("date_from") {
            filter.date_from = Some(parse_date("date_from", raw, false)?);
        }
        if let Some(raw) = get("date_to") {
            filter.date_to = Some(parse_date("date_to", raw, true)?);
        }

        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(Error::invalid_filter(
                    "date_from",
                    "must not be later than date_to",
                ));
            }
        }

        Ok(filter)
    }

    /// Filter by user.
    pub fn by_user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    /// Filter by asset.
    pub fn by_asset(mut self, asset: &str) -> Self {
        self.asset = Some(asset.to_string());
        self
    }

    /// Filter by session.
    pub fn by_session(mut self, session: &str) -> Self {
        self.session = Some(session.to_string());
        self
    }

    /// Filter by risk level.
    pub fn by_risk_level(mut self, level: u8) -> Self {
        self.risk_level = Some(level);
        self
    }

    /// Filter by date range.
    pub fn by_date_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Narrow the filter to what `scope` may see.
    ///
    /// An organization scope overrides any `org_id` parameter.
    pub fn scoped(mut self, scope: &Scope) -> Self {
        if let Scope::Org(org) = scope {
            self.org_id = Some(org.clone());
        }
        self
    }

    /// Check if a record matches this filter.
    pub fn matches(&self, record: &CommandRecord) -> bool {
        if let Some(org) = &self.org_id {
            if &record.org_id != org {
                return false;
            }
        }

        if let Some(user) = &self.user {
            if &record.user != user {
                return false;
            }
        }

        if let Some(asset) = &self.asset {
            if &record.asset != asset {
                return false;
            }
        }

        if let Some(account) = &self.account {
            if &record.account != account {
                return false;
            }
        }

        if let Some(session) = &self.session {
            if &record.session != session {
                return false;
            }
        }

        if let Some(input) = &self.input {
            if !record.input.contains(input.as_str()) {
                return false;
            }
        }

        if let Some(level) = self.risk_level {
            if record.risk_level != level {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if record.timestamp < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if record.timestamp > to {
                return false;
            }
        }

        true
    }
}

fn param<'a>(params: &'a FilterParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD`. A bare upper bound covers the whole day.
fn parse_date(field: &str, raw: &str, end_of_day: bool) -> Result<Timestamp> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| Error::invalid_filter(field, format!("`{}` is not a valid date", raw)))?;
    let naive = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| Error::invalid_filter(field, format!("`{}` is out of range", raw)))?;

    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> FilterParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_params() {
        let filter = CommandFilter::from_params(&FilterParams::new()).unwrap();
        assert_eq!(filter, CommandFilter::new());
    }

    #[test]
    fn test_parse_params() {
        let filter = CommandFilter::from_params(&params(&[
            ("user", "alice"),
            ("system_user", "root"),
            ("risk_level", "5"),
            ("date_from", "2024-01-01"),
            ("date_to", "2024-01-31"),
            ("limit", "20"),
        ]))
        .unwrap();

        assert_eq!(filter.user.as_deref(), Some("alice"));
        assert_eq!(filter.account.as_deref(), Some("root"));
        assert_eq!(filter.risk_level, Some(5));
        assert!(filter.date_from.unwrap() < filter.date_to.unwrap());
    }

    #[test]
    fn test_bad_risk_level() {
        let err = CommandFilter::from_params(&params(&[("risk_level", "high")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "risk_level"));
    }

    #[test]
    fn test_bad_date() {
        let err = CommandFilter::from_params(&params(&[("date_from", "yesterday")])).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { ref field, .. } if field == "date_from"));
    }

    #[test]
    fn test_inverted_range() {
        let result = CommandFilter::from_params(&params(&[
            ("date_from", "2024-02-01"),
            ("date_to", "2024-01-01"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rfc3339_date() {
        let filter =
            CommandFilter::from_params(&params(&[("date_from", "2024-01-01T08:00:00+08:00")])).unwrap();
        assert_eq!(filter.date_from.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_filter_matches() {
        let record = CommandRecord::new("org-a", "s-1", "cat /etc/passwd").by_user("alice");

        assert!(CommandFilter::new().by_user("alice").matches(&record));
        assert!(!CommandFilter::new().by_user("bob").matches(&record));

        let mut substring = CommandFilter::new();
        substring.input = Some("passwd".to_string());
        assert!(substring.matches(&record));
    }

    #[test]
    fn test_scope_overrides_org_param() {
        let record = CommandRecord::new("org-a", "s-1", "ls");
        let filter = CommandFilter::from_params(&params(&[("org_id", "org-a")]))
            .unwrap()
            .scoped(&Scope::org("org-b"));
        assert!(!filter.matches(&record));

        let root = CommandFilter::new().scoped(&Scope::Root);
        assert!(root.matches(&record));
    }
}
