use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created: DateTime<Utc>,
    /// Empty until the task is first updated; persisted as `""`.
    #[serde(default, with = "empty_timestamp")]
    pub updated: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: u64, title: String, description: String, created: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            description,
            status: Status::Pending,
            created,
            updated: None,
        }
    }
}

/// Task status as stored on disk.
///
/// Only the first three values are reachable through the list filters, but
/// `update --s` accepts any string, so unknown values are kept verbatim.
#[derive(Debug, Default, Eq, PartialEq, Serialize, Deserialize, Clone)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Pending,
    Started,
    Completed,
    Other(String),
}

impl Status {
    /// Lower-cases user input before interpreting it.
    pub fn normalized(input: &str) -> Self {
        Self::from(input.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Started => "started",
            Status::Completed => "completed",
            Status::Other(other) => other,
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Status::Pending,
            "started" => Status::Started,
            "completed" => Status::Completed,
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts RFC 3339 as well as ISO-8601 forms without an offset, which are
/// read as UTC. Timestamps are always written back as RFC 3339.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 3] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];

    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
    {
        return Some(timestamp.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

mod empty_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(timestamp) => timestamp.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)?.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => super::parse_timestamp(raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}
