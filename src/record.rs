// SPDX-License-Identifier: MIT

//! The case record model.
//!
//! Datasets arrive as loosely-typed JSON with no schema enforcement,
//! either as an array of records or as an object-of-objects keyed by
//! an opaque case identifier. Records are normalized into an explicit
//! type once at load time so the aggregation layer never needs
//! defensive fallbacks.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::datetime::{self, ChronoDateTime};
use crate::prelude::*;

/// The value used when a record is missing the field being grouped or
/// displayed.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UrlStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl UrlStatus {
    /// Lenient parse. Anything unrecognized maps to `Unknown` rather
    /// than failing the record.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "ACTIVE" => UrlStatus::Active,
            "INACTIVE" => UrlStatus::Inactive,
            _ => UrlStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrlStatus::Active => "ACTIVE",
            UrlStatus::Inactive => "INACTIVE",
            UrlStatus::Unknown => "UNKNOWN",
        }
    }
}

/// One reported case. All fields are optional, reflecting the source
/// data. `date` is the parsed form of `found_on`, filled in during
/// normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(default, alias = "case", alias = "caseId")]
    pub id: Option<String>,

    #[serde(default, alias = "foundOn", alias = "date")]
    pub found_on: Option<String>,

    #[serde(skip)]
    pub date: Option<ChronoDateTime>,

    #[serde(default, alias = "attackMethod", alias = "method")]
    pub attack_method: Option<String>,

    #[serde(default, alias = "attackVector", alias = "vector")]
    pub attack_vector: Option<String>,

    #[serde(default, alias = "attackGoal", alias = "goal")]
    pub attack_goal: Option<String>,

    #[serde(default, alias = "attackSurface", alias = "surface")]
    pub attack_surface: Option<String>,

    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default, alias = "urlStatus")]
    pub url_status: Option<String>,

    #[serde(skip)]
    pub status: UrlStatus,

    /// Fields present in the source record that the struct doesn't
    /// model. Kept so nothing is silently dropped.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CaseRecord {
    /// Normalize the raw record: parse the found-on date and the URL
    /// status. A malformed date is left as `None`, the record is kept.
    pub fn normalize(&mut self) {
        if let Some(found_on) = &self.found_on {
            match datetime::parse(found_on, None) {
                Ok(dt) => self.date = Some(dt),
                Err(err) => {
                    warn!(
                        "Unparseable found-on date {:?} in case {}: {}",
                        found_on,
                        self.id.as_deref().unwrap_or("?"),
                        err
                    );
                }
            }
        }
        self.status = self
            .url_status
            .as_deref()
            .map(UrlStatus::parse)
            .unwrap_or_default();
    }

    /// Look up a field by name as it appears in filter and group-by
    /// specifications. Unmodeled fields fall through to `extra`.
    pub fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        fn opt(v: &Option<String>) -> Option<Cow<'_, str>> {
            v.as_deref().map(Cow::Borrowed)
        }
        match name {
            "id" | "case" => opt(&self.id),
            "found_on" | "date" => opt(&self.found_on),
            "attack_method" | "method" => opt(&self.attack_method),
            "attack_vector" | "vector" => opt(&self.attack_vector),
            "attack_goal" | "goal" => opt(&self.attack_goal),
            "attack_surface" | "surface" => opt(&self.attack_surface),
            "server" => opt(&self.server),
            "region" => opt(&self.region),
            "url" => opt(&self.url),
            "url_status" | "status" => Some(Cow::Borrowed(self.status.as_str())),
            _ => match self.extra.get(name)? {
                serde_json::Value::String(s) => Some(Cow::Borrowed(s.as_str())),
                serde_json::Value::Number(n) => Some(Cow::Owned(n.to_string())),
                serde_json::Value::Bool(b) => Some(Cow::Owned(b.to_string())),
                _ => None,
            },
        }
    }

    /// All stringifiable field values, lowercased, for free-text
    /// matching.
    pub fn searchable_text(&self) -> String {
        let mut parts: Vec<&str> = vec![];
        for field in [
            &self.id,
            &self.found_on,
            &self.attack_method,
            &self.attack_vector,
            &self.attack_goal,
            &self.attack_surface,
            &self.server,
            &self.region,
            &self.url,
        ]
        .into_iter()
        .flatten()
        {
            parts.push(field);
        }
        parts.push(self.status.as_str());
        let mut text = parts.join(" ");
        for value in self.extra.values() {
            match value {
                serde_json::Value::String(s) => {
                    text.push(' ');
                    text.push_str(s);
                }
                serde_json::Value::Number(n) => {
                    text.push(' ');
                    text.push_str(&n.to_string());
                }
                serde_json::Value::Bool(b) => {
                    text.push(' ');
                    text.push_str(&b.to_string());
                }
                _ => {}
            }
        }
        text.to_lowercase()
    }
}

/// Decode a dataset from its JSON value form. Accepts both an array
/// of records and an object-of-objects; in the keyed form the outer
/// key supplies the case ID when the record body lacks one.
pub fn from_value(value: serde_json::Value) -> Result<Vec<CaseRecord>, AppError> {
    let mut records: Vec<CaseRecord> = match value {
        serde_json::Value::Array(entries) => entries
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?,
        serde_json::Value::Object(map) => {
            let mut records = Vec::with_capacity(map.len());
            for (key, entry) in map {
                let mut record: CaseRecord = serde_json::from_value(entry)?;
                if record.id.is_none() {
                    record.id = Some(key);
                }
                records.push(record);
            }
            records
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "dataset is not an array or object: {}",
                other
            )));
        }
    };
    for record in &mut records {
        record.normalize();
    }
    Ok(records)
}
