// SPDX-License-Identifier: MIT

pub type ChronoDateTime = chrono::DateTime<chrono::FixedOffset>;

#[derive(Debug)]
pub struct ParseError(pub String);

impl std::error::Error for ParseError {}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a timestamp, allowing partial timestamps. Missing fields are
/// filled in with the start of their range, so "2024-05" becomes
/// 2024-05-01T00:00:00. A default timezone offset is applied when the
/// input doesn't carry one.
pub fn parse(input: &str, tz_offset: Option<&str>) -> Result<ChronoDateTime, ParseError> {
    // First attempt to parse it as is.
    if let Ok(ts) = input.parse::<ChronoDateTime>() {
        return Ok(ts);
    }

    let default_tz = tz_offset.unwrap_or("Z");

    // Now attempt to match it and fill in the missing bits. Requires at least a year.
    let re =
        r"^(\d{4})-?(\d{2})?-?(\d{2})?T?(\d{2})?:?(\d{2})?:?(\d{2})?(\.(\d+))?(([+\-]\d{4})|Z)?";
    let re = regex::Regex::new(re).unwrap();
    if let Some(c) = re.captures(input) {
        let year = c.get(1).map_or("", |m| m.as_str());
        let month = c.get(2).map_or("01", |m| m.as_str());
        let day = c.get(3).map_or("01", |m| m.as_str());
        let hour = c.get(4).map_or("00", |m| m.as_str());
        let minute = c.get(5).map_or("00", |m| m.as_str());
        let second = c.get(6).map_or("00", |m| m.as_str());
        let subs = c.get(8).map_or("0", |m| m.as_str());
        let offset = c.get(9).map_or(default_tz, |m| m.as_str());

        let fixed = format!("{year}-{month}-{day}T{hour}:{minute}:{second}.{subs}{offset}");

        // Try again.
        if let Ok(ts) = fixed.parse::<ChronoDateTime>() {
            return Ok(ts);
        }
    }

    Err(ParseError(format!("invalid timestamp: {}", input)))
}

/// Granularity for bucketing record dates into time-series keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Day,
    Week,
    Month,
    Quarter,
}

impl DateBucket {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Some(DateBucket::Day),
            "week" | "weekly" => Some(DateBucket::Week),
            "month" | "monthly" => Some(DateBucket::Month),
            "quarter" | "quarterly" => Some(DateBucket::Quarter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateBucket::Day => "day",
            DateBucket::Week => "week",
            DateBucket::Month => "month",
            DateBucket::Quarter => "quarter",
        }
    }
}

impl std::fmt::Display for DateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Truncate a timestamp to a bucket key. Keys are built so that their
/// lexicographic order is also their chronological order, so
/// time-series results can be sorted with a plain string sort.
pub fn bucket_key(dt: &ChronoDateTime, bucket: DateBucket) -> String {
    use chrono::Datelike;
    match bucket {
        DateBucket::Day => dt.format("%Y-%m-%d").to_string(),
        DateBucket::Week => {
            let iso = dt.iso_week();
            format!("{:04}-W{:02}", iso.year(), iso.week())
        }
        DateBucket::Month => dt.format("%Y-%m").to_string(),
        DateBucket::Quarter => {
            let quarter = dt.month0() / 3 + 1;
            format!("{:04}-Q{}", dt.year(), quarter)
        }
    }
}
