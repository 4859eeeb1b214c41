//! Filtering for the walk list

use crate::core::entity::InspectionStatus;
use crate::entities::{store_display_name, Inspection, Store};

/// Criteria for narrowing a list of inspections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InspectionFilter {
    pub store_id: Option<String>,
    pub status: Option<InspectionStatus>,
    /// Case-insensitive match on store name, inspector name, or ISO date
    pub search: Option<String>,
}

impl InspectionFilter {
    pub fn is_empty(&self) -> bool {
        self.store_id.is_none() && self.status.is_none() && self.search_term().is_none()
    }

    fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, inspection: &Inspection, stores: &[Store]) -> bool {
        if let Some(store_id) = &self.store_id {
            if &inspection.store_id != store_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if inspection.status != status {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                store_display_name(stores, &inspection.store_id)
                    .to_lowercase()
                    .contains(&term)
                    || inspection.inspected_by.name.to_lowercase().contains(&term)
                    || inspection.date.to_string().contains(&term)
            }
        }
    }

    /// Keep matching inspections, preserving order
    pub fn apply(&self, inspections: Vec<Inspection>, stores: &[Store]) -> Vec<Inspection> {
        if self.is_empty() {
            return inspections;
        }
        inspections
            .into_iter()
            .filter(|i| self.matches(i, stores))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{initialize_checklist_items, UserRef};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn walk(store_id: &str, inspector: &str, day: u32, status: InspectionStatus) -> Inspection {
        let at = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();
        Inspection {
            id: format!("INSP-{}", day),
            store_id: store_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            items: initialize_checklist_items(),
            status,
            inspected_by: UserRef {
                user_id: "u".to_string(),
                name: inspector.to_string(),
            },
            corrected_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    fn stores() -> Vec<Store> {
        vec![Store {
            id: "S1".to_string(),
            name: "Main Street Market".to_string(),
            location: None,
            created_at: None,
        }]
    }

    fn sample() -> Vec<Inspection> {
        vec![
            walk("S1", "Dana", 3, InspectionStatus::Draft),
            walk("S2", "Sam", 2, InspectionStatus::Completed),
            walk("S1", "Sam", 1, InspectionStatus::Completed),
        ]
    }

    fn ids(list: &[Inspection]) -> Vec<&str> {
        list.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = InspectionFilter {
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.apply(sample(), &stores()).len(), 3);
    }

    #[test]
    fn test_store_and_status() {
        let filter = InspectionFilter {
            store_id: Some("S1".to_string()),
            status: Some(InspectionStatus::Completed),
            search: None,
        };
        assert_eq!(ids(&filter.apply(sample(), &stores())), vec!["INSP-1"]);
    }

    #[test]
    fn test_search_over_store_name_inspector_and_date() {
        let by_store = InspectionFilter {
            search: Some("MARKET".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_store.apply(sample(), &stores())), vec!["INSP-3", "INSP-1"]);

        let by_inspector = InspectionFilter {
            search: Some("sam".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_inspector.apply(sample(), &stores())), vec!["INSP-2", "INSP-1"]);

        let by_date = InspectionFilter {
            search: Some("2024-05-02".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&by_date.apply(sample(), &stores())), vec!["INSP-2"]);

        // unknown stores are searched by their fallback name
        let fallback = InspectionFilter {
            search: Some("store #s2".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&fallback.apply(sample(), &stores())), vec!["INSP-2"]);
    }
}
