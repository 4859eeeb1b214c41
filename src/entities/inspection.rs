//! Inspection entity - one daily walk through a store

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{clock_time, timestamp, Entity, InspectionStatus};
use crate::store::Collection;

/// The answer recorded for one checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Answer {
    #[default]
    Unanswered,
    Passed,
    Failed {
        /// Whether the problem was corrected during the walk
        fixed: bool,
    },
}

impl Answer {
    pub fn is_answered(&self) -> bool {
        !matches!(self, Answer::Unanswered)
    }

    /// Short label for tables
    pub fn label(&self) -> &'static str {
        match self {
            Answer::Unanswered => "-",
            Answer::Passed => "yes",
            Answer::Failed { fixed: true } => "no (fixed)",
            Answer::Failed { fixed: false } => "no",
        }
    }
}

/// One checklist question plus its answer
///
/// Persisted as `{id, description, passed, fixed, comments}` where `passed`
/// is `null` while unanswered. A stored `fixed: true` on an item that did not
/// fail is dropped on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredItem", into = "StoredItem")]
pub struct InspectionItem {
    pub id: u32,
    pub description: String,
    pub answer: Answer,
    pub comments: String,
}

impl InspectionItem {
    /// `Some(true)` passed, `Some(false)` failed, `None` unanswered
    pub fn passed(&self) -> Option<bool> {
        match self.answer {
            Answer::Unanswered => None,
            Answer::Passed => Some(true),
            Answer::Failed { .. } => Some(false),
        }
    }

    pub fn fixed(&self) -> bool {
        matches!(self.answer, Answer::Failed { fixed: true })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.answer, Answer::Failed { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct StoredItem {
    id: u32,
    #[serde(default)]
    description: String,
    #[serde(default)]
    passed: Option<bool>,
    #[serde(default)]
    fixed: bool,
    #[serde(default)]
    comments: String,
}

impl From<StoredItem> for InspectionItem {
    fn from(raw: StoredItem) -> Self {
        let answer = match raw.passed {
            None => Answer::Unanswered,
            Some(true) => Answer::Passed,
            Some(false) => Answer::Failed { fixed: raw.fixed },
        };
        Self {
            id: raw.id,
            description: raw.description,
            answer,
            comments: raw.comments,
        }
    }
}

impl From<InspectionItem> for StoredItem {
    fn from(item: InspectionItem) -> Self {
        Self {
            id: item.id,
            passed: item.passed(),
            fixed: item.fixed(),
            description: item.description,
            comments: item.comments,
        }
    }
}

/// Identity stamped on a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
    pub name: String,
}

/// Who corrected the failed items: a free-text name from the form, or a
/// signed-in user attached on completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectedBy {
    User(UserRef),
    Name(String),
}

impl CorrectedBy {
    pub fn display_name(&self) -> &str {
        match self {
            CorrectedBy::User(user) => &user.name,
            CorrectedBy::Name(name) => name,
        }
    }
}

/// An inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    /// Document id (kept outside the stored body)
    #[serde(default)]
    pub id: String,

    pub store_id: String,

    /// Walk date
    pub date: NaiveDate,

    /// Walk time of day
    #[serde(with = "clock_time")]
    pub time: NaiveTime,

    pub items: Vec<InspectionItem>,

    #[serde(default)]
    pub status: InspectionStatus,

    pub inspected_by: UserRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_by: Option<CorrectedBy>,

    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Entity for Inspection {
    const COLLECTION: Collection = Collection::Inspections;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Per-inspection answer counts for the detail view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InspectionSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub fixed: usize,
    pub unanswered: usize,
}

impl Inspection {
    pub fn summary(&self) -> InspectionSummary {
        let mut summary = InspectionSummary {
            total: self.items.len(),
            ..Default::default()
        };
        for item in &self.items {
            match item.answer {
                Answer::Unanswered => summary.unanswered += 1,
                Answer::Passed => summary.passed += 1,
                Answer::Failed { fixed } => {
                    summary.failed += 1;
                    if fixed {
                        summary.fixed += 1;
                    }
                }
            }
        }
        summary
    }

    pub fn has_failed_items(&self) -> bool {
        self.items.iter().any(InspectionItem::is_failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::checklist::initialize_checklist_items;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Inspection {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        Inspection {
            id: "INSP-1".to_string(),
            store_id: "STORE-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            items: initialize_checklist_items(),
            status: InspectionStatus::Draft,
            inspected_by: UserRef {
                user_id: "u1".to_string(),
                name: "Dana".to_string(),
            },
            corrected_by: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_item_wire_format() {
        let item = InspectionItem {
            id: 4,
            description: "Are tongs clean ? Are Tongs in place ?".to_string(),
            answer: Answer::Failed { fixed: true },
            comments: "replaced".to_string(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["passed"], json!(false));
        assert_eq!(value["fixed"], json!(true));
        assert_eq!(value["comments"], json!("replaced"));

        let unanswered = serde_json::to_value(&InspectionItem {
            answer: Answer::Unanswered,
            ..item
        })
        .unwrap();
        assert_eq!(unanswered["passed"], serde_json::Value::Null);
        assert_eq!(unanswered["fixed"], json!(false));
    }

    #[test]
    fn test_fixed_without_failure_is_dropped() {
        let item: InspectionItem =
            serde_json::from_value(json!({"id": 1, "passed": true, "fixed": true})).unwrap();
        assert_eq!(item.answer, Answer::Passed);
        assert!(!item.fixed());
    }

    #[test]
    fn test_inspection_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        for field in [
            "storeId",
            "date",
            "time",
            "items",
            "status",
            "inspectedBy",
            "createdAt",
            "updatedAt",
        ] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(value["time"], json!("09:30"));
        assert_eq!(value["date"], json!("2024-05-01"));
        assert_eq!(value["status"], json!("draft"));
        assert_eq!(value["inspectedBy"]["userId"], json!("u1"));
        assert!(value.get("correctedBy").is_none());
    }

    #[test]
    fn test_document_strips_and_restores_id() {
        let inspection = sample();
        let doc = inspection.to_document().unwrap();
        assert!(!doc.contains_key("id"));

        let restored = Inspection::from_document("INSP-1", doc).unwrap();
        assert_eq!(restored, inspection);
    }

    #[test]
    fn test_corrected_by_accepts_both_shapes() {
        let name: CorrectedBy = serde_json::from_value(json!("Sam")).unwrap();
        assert_eq!(name, CorrectedBy::Name("Sam".to_string()));

        let user: CorrectedBy =
            serde_json::from_value(json!({"userId": "u2", "name": "Lee"})).unwrap();
        assert_eq!(user.display_name(), "Lee");
    }

    #[test]
    fn test_summary_counts() {
        let mut inspection = sample();
        inspection.items[0].answer = Answer::Passed;
        inspection.items[1].answer = Answer::Failed { fixed: true };
        inspection.items[2].answer = Answer::Failed { fixed: false };

        let summary = inspection.summary();
        assert_eq!(summary.total, 26);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.fixed, 1);
        assert_eq!(summary.unanswered, 23);
        assert!(inspection.has_failed_items());
    }
}
