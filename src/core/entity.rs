//! Entity trait - common interface for persisted document types

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::store::{Collection, Document, StoreError};

/// Common trait for records kept in a document collection
///
/// The document id lives outside the stored body, the way document databases
/// keep it, so `to_document` strips it and `from_document` puts it back.
pub trait Entity: Serialize + DeserializeOwned {
    /// Collection the entity is stored in
    const COLLECTION: Collection;

    /// Get the document id
    fn id(&self) -> &str;

    /// Attach the id assigned by the store
    fn set_id(&mut self, id: String);

    /// Decode a stored document body
    fn from_document(id: &str, doc: Document) -> Result<Self, StoreError> {
        let mut entity: Self =
            serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::Decode {
                collection: Self::COLLECTION,
                id: id.to_string(),
                message: e.to_string(),
            })?;
        entity.set_id(id.to_string());
        Ok(entity)
    }

    /// Encode into a document body (without the id)
    fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut doc)) => {
                doc.remove("id");
                Ok(doc)
            }
            Ok(other) => Err(StoreError::Encode(format!(
                "expected an object for {}, got {}",
                Self::COLLECTION,
                other
            ))),
            Err(e) => Err(StoreError::Encode(e.to_string())),
        }
    }
}

/// Inspection lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum InspectionStatus {
    #[default]
    Draft,
    Completed,
    Reviewed,
}

impl InspectionStatus {
    /// Whether the status machine allows moving from `self` to `to`
    ///
    /// Re-saving a draft as a draft counts as a valid transition.
    pub fn can_transition_to(self, to: InspectionStatus) -> bool {
        matches!(
            (self, to),
            (InspectionStatus::Draft, InspectionStatus::Draft)
                | (InspectionStatus::Draft, InspectionStatus::Completed)
                | (InspectionStatus::Completed, InspectionStatus::Reviewed)
        )
    }

    /// Only drafts may be edited
    pub fn is_editable(self) -> bool {
        self == InspectionStatus::Draft
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectionStatus::Draft => write!(f, "draft"),
            InspectionStatus::Completed => write!(f, "completed"),
            InspectionStatus::Reviewed => write!(f, "reviewed"),
        }
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(InspectionStatus::Draft),
            "completed" => Ok(InspectionStatus::Completed),
            "reviewed" => Ok(InspectionStatus::Reviewed),
            _ => Err(format!(
                "Unknown status: {}. Use draft, completed, or reviewed",
                s
            )),
        }
    }
}

/// Timestamps as fixed-width RFC 3339 strings (millisecond precision, `Z`)
///
/// Fixed width keeps lexical order equal to chronological order, which the
/// backends rely on when sorting by `createdAt`.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_str(&super::format(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| super::parse(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Wall-clock time of day as `HH:MM`
pub mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_transitions() {
        assert!(InspectionStatus::Draft.can_transition_to(InspectionStatus::Completed));
        assert!(InspectionStatus::Draft.can_transition_to(InspectionStatus::Draft));
        assert!(InspectionStatus::Completed.can_transition_to(InspectionStatus::Reviewed));
        assert!(!InspectionStatus::Completed.can_transition_to(InspectionStatus::Draft));
        assert!(!InspectionStatus::Reviewed.can_transition_to(InspectionStatus::Completed));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&InspectionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        assert_eq!(
            "Reviewed".parse::<InspectionStatus>().unwrap(),
            InspectionStatus::Reviewed
        );
        assert!("closed".parse::<InspectionStatus>().is_err());
    }

    #[test]
    fn test_timestamp_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1500);
        let (fa, fb) = (timestamp::format(&a), timestamp::format(&b));
        assert_eq!(fa, "2024-05-01T09:00:00.000Z");
        assert_eq!(fa.len(), fb.len());
        assert!(fa < fb);
        assert_eq!(timestamp::parse(&fb).unwrap(), b);
    }
}
