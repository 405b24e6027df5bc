//! Audit stamps (`modifiedBy` / `modifiedOn`) attached to every mutation.

use chrono::{NaiveDateTime, Utc};

/// Wire format of `modifiedOn`: UTC, second precision, no zone suffix.
pub const MODIFIED_ON_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum AuditClock {
    System,
    /// Fixed instant; used by tests so payloads are reproducible.
    Fixed(NaiveDateTime),
}

impl AuditClock {
    pub fn now(&self) -> String {
        match self {
            Self::System    => Utc::now().naive_utc().format(MODIFIED_ON_FORMAT).to_string(),
            Self::Fixed(at) => at.format(MODIFIED_ON_FORMAT).to_string(),
        }
    }

    pub fn stamp(&self, operator_id: &str) -> AuditStamp {
        AuditStamp {
            modified_by: operator_id.to_string(),
            modified_on: self.now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    pub modified_by: String,
    pub modified_on: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_formats_without_fraction_or_zone() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_milli_opt(7, 5, 1, 250))
            .unwrap();
        let stamp = AuditClock::Fixed(at).stamp("u-1");
        assert_eq!(stamp.modified_on, "2024-03-09T07:05:01");
        assert_eq!(stamp.modified_by, "u-1");
    }

    #[test]
    fn system_clock_matches_wire_format() {
        let now = AuditClock::System.now();
        assert!(NaiveDateTime::parse_from_str(&now, MODIFIED_ON_FORMAT).is_ok());
    }
}
