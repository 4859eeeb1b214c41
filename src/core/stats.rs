//! Walk statistics - global and per-store answer counts and rates
//!
//! A pure fold over already loaded inspections. Store rows appear in the
//! order their store is first seen in the input.

use serde::Serialize;

use crate::core::entity::InspectionStatus;
use crate::entities::{store_display_name, Answer, Inspection, Store};

/// Percentage of `part` in `whole`, rounded half-up; 0 when `whole` is 0
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u32
}

/// `passed / (passed + failed)` as a whole percentage
pub fn compliance_rate(passed: usize, failed: usize) -> u32 {
    percentage(passed, passed + failed)
}

/// `fixed / failed` as a whole percentage
pub fn fix_rate(fixed: usize, failed: usize) -> u32 {
    percentage(fixed, failed)
}

/// Counts for one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub store_id: String,
    pub name: String,
    pub inspections: usize,
    pub passed: usize,
    pub failed: usize,
    pub fixed: usize,
    pub compliance_rate: u32,
    pub fix_rate: u32,
}

/// Counts across every inspection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkStats {
    pub total: usize,
    pub completed: usize,
    pub draft: usize,
    pub passed_items: usize,
    pub failed_items: usize,
    pub fixed_items: usize,
    pub compliance_rate: u32,
    pub fix_rate: u32,
    pub store_stats: Vec<StoreStats>,
}

impl WalkStats {
    pub fn compute(inspections: &[Inspection], stores: &[Store]) -> Self {
        let mut stats = WalkStats {
            total: inspections.len(),
            ..Default::default()
        };

        for inspection in inspections {
            match inspection.status {
                InspectionStatus::Completed => stats.completed += 1,
                InspectionStatus::Draft => stats.draft += 1,
                InspectionStatus::Reviewed => {}
            }

            let row = match stats
                .store_stats
                .iter()
                .position(|s| s.store_id == inspection.store_id)
            {
                Some(idx) => &mut stats.store_stats[idx],
                None => {
                    stats.store_stats.push(StoreStats {
                        store_id: inspection.store_id.clone(),
                        name: store_display_name(stores, &inspection.store_id),
                        inspections: 0,
                        passed: 0,
                        failed: 0,
                        fixed: 0,
                        compliance_rate: 0,
                        fix_rate: 0,
                    });
                    let last = stats.store_stats.len() - 1;
                    &mut stats.store_stats[last]
                }
            };
            row.inspections += 1;

            for item in &inspection.items {
                match item.answer {
                    Answer::Unanswered => {}
                    Answer::Passed => {
                        stats.passed_items += 1;
                        row.passed += 1;
                    }
                    Answer::Failed { fixed } => {
                        stats.failed_items += 1;
                        row.failed += 1;
                        if fixed {
                            stats.fixed_items += 1;
                            row.fixed += 1;
                        }
                    }
                }
            }
        }

        for row in &mut stats.store_stats {
            row.compliance_rate = compliance_rate(row.passed, row.failed);
            row.fix_rate = fix_rate(row.fixed, row.failed);
        }
        stats.compliance_rate = compliance_rate(stats.passed_items, stats.failed_items);
        stats.fix_rate = fix_rate(stats.fixed_items, stats.failed_items);
        stats
    }

    /// Answered items across all inspections
    pub fn items_checked(&self) -> usize {
        self.passed_items + self.failed_items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{InspectionItem, UserRef};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    fn item(id: u32, answer: Answer) -> InspectionItem {
        InspectionItem {
            id,
            description: String::new(),
            answer,
            comments: String::new(),
        }
    }

    fn inspection(store_id: &str, status: InspectionStatus, items: Vec<InspectionItem>) -> Inspection {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        Inspection {
            id: String::new(),
            store_id: store_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            items,
            status,
            inspected_by: UserRef {
                user_id: "u1".to_string(),
                name: "Dana".to_string(),
            },
            corrected_by: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_single_store_example() {
        let inspections = vec![inspection(
            "A",
            InspectionStatus::Completed,
            vec![
                item(1, Answer::Passed),
                item(2, Answer::Failed { fixed: true }),
                item(3, Answer::Failed { fixed: false }),
            ],
        )];

        let stats = WalkStats::compute(&inspections, &[]);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.passed_items, 1);
        assert_eq!(stats.failed_items, 2);
        assert_eq!(stats.fixed_items, 1);
        assert_eq!(stats.compliance_rate, 33);
        assert_eq!(stats.fix_rate, 50);

        assert_eq!(stats.store_stats.len(), 1);
        let row = &stats.store_stats[0];
        assert_eq!(row.name, "Store #A");
        assert_eq!(
            (row.inspections, row.passed, row.failed, row.fixed),
            (1, 1, 2, 1)
        );
    }

    #[test]
    fn test_rates_zero_without_denominator() {
        let stats = WalkStats::compute(&[], &[]);
        assert_eq!(stats, WalkStats::default());
        assert_eq!(compliance_rate(0, 0), 0);
        assert_eq!(fix_rate(0, 0), 0);
    }

    #[test]
    fn test_rounding_is_half_up() {
        assert_eq!(percentage(1, 8), 13); // 12.5
        assert_eq!(percentage(1, 200), 1); // 0.5
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(7, 5), 100);
    }

    #[test]
    fn test_store_rows_in_first_appearance_order() {
        let stores = vec![Store {
            id: "B".to_string(),
            name: "Uptown".to_string(),
            location: None,
            created_at: None,
        }];
        let inspections = vec![
            inspection("B", InspectionStatus::Draft, vec![item(1, Answer::Passed)]),
            inspection("A", InspectionStatus::Reviewed, vec![item(1, Answer::Unanswered)]),
            inspection("B", InspectionStatus::Completed, vec![item(1, Answer::Passed)]),
        ];

        let stats = WalkStats::compute(&inspections, &stores);
        let names: Vec<&str> = stats.store_stats.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Uptown", "Store #A"]);
        assert_eq!(stats.store_stats[0].inspections, 2);
        assert_eq!(stats.store_stats[0].compliance_rate, 100);
        assert_eq!((stats.total, stats.completed, stats.draft), (3, 1, 1));
        assert_eq!(stats.items_checked(), 2);
    }
}
