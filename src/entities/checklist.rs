//! Daily walk checklist catalog
//!
//! The catalog is a fixed, ordered table. Every new inspection gets one item
//! per entry; changing the table affects only inspections created afterwards.

use serde::Serialize;

use crate::entities::inspection::{Answer, InspectionItem};

/// Catalog revision, bumped whenever the table below changes
pub const CATALOG_VERSION: u32 = 1;

/// One compliance check in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItemDefinition {
    pub id: u32,
    pub description: &'static str,
}

const fn item(id: u32, description: &'static str) -> ChecklistItemDefinition {
    ChecklistItemDefinition { id, description }
}

/// The daily walk checklist, in display order
pub const CHECKLIST: &[ChecklistItemDefinition] = &[
    item(1, "Is the hotdog/Grill Area clean ?"),
    item(
        2,
        "Are there product Tags/IDs available for each product on roller grill ?",
    ),
    item(3, "Hotdog Buns labeled and are in date ?"),
    item(4, "Are tongs clean ? Are Tongs in place ?"),
    item(5, "Fresh Condiments and Bottle Condiments labeled ?"),
    item(6, "Under Counter Hotdog Containers labeled properly ?"),
    item(7, "Is fountain area clean ?"),
    item(8, "Are fountain machine nozzles free of any buildup ?"),
    item(
        9,
        "Are top of coffee machine and container tops free of beans and dust ?",
    ),
    item(10, "Is coffee area clean ?"),
    item(
        11,
        "Do cold creamers have expiration labels on them and machine free from buildup ?",
    ),
    item(12, "Pizza Warmer / Flexserve free of any expired products ?"),
    item(
        13,
        "Does bakery case has all labels/tags that include calories information",
    ),
    item(14, "Only \"Approved\" chemicals in chemical area ?"),
    item(15, "Any chemical bottle without lid ?"),
    item(16, "Santizer Bucket prepared and labeled ?"),
    item(17, "Santizer Sink Prepared and labeled ?"),
    item(18, "Sanitizer bottle prepared and labeled ?"),
    item(
        19,
        "Handwashing Sink free of any clutter and Employee Cups/Mugs",
    ),
    item(20, "Ecosure Logs are in Conspicuous and visible place ?"),
    item(
        21,
        "Restrooms Clean and stocked with Handwashing soap,tissue and paper towels ?",
    ),
    item(22, "Dumspter Lid Closed ?"),
    item(23, "Paper Towels available near handwashing sink ?"),
    item(24, "Mops Stored properly ?"),
    item(25, "Cashier knows about 6 food allergens ?"),
    item(26, "Microwaves clean ?"),
];

/// Look up a catalog entry by id
pub fn definition(id: u32) -> Option<&'static ChecklistItemDefinition> {
    CHECKLIST.iter().find(|d| d.id == id)
}

/// Fresh, unanswered items for a new inspection, one per catalog entry
pub fn initialize_checklist_items() -> Vec<InspectionItem> {
    CHECKLIST
        .iter()
        .map(|def| InspectionItem {
            id: def.id,
            description: def.description.to_string(),
            answer: Answer::Unanswered,
            comments: String::new(),
        })
        .collect()
}

/// Whether `items` carries exactly the catalog ids, in catalog order
pub fn matches_catalog(items: &[InspectionItem]) -> bool {
    items.len() == CHECKLIST.len()
        && items
            .iter()
            .zip(CHECKLIST.iter())
            .all(|(item, def)| item.id == def.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_26_unique_ids() {
        assert_eq!(CHECKLIST.len(), 26);
        let ids: HashSet<u32> = CHECKLIST.iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), 26);
        assert!(CHECKLIST.iter().enumerate().all(|(i, d)| d.id == i as u32 + 1));
    }

    #[test]
    fn test_initialize_checklist_items_all_unanswered() {
        let items = initialize_checklist_items();
        assert_eq!(items.len(), CHECKLIST.len());
        for item in &items {
            assert_eq!(item.answer, Answer::Unanswered);
            assert_eq!(item.passed(), None);
            assert!(!item.fixed());
            assert!(item.comments.is_empty());
        }
        assert!(matches_catalog(&items));
    }

    #[test]
    fn test_each_call_is_independent() {
        let mut first = initialize_checklist_items();
        first[0].answer = Answer::Passed;
        let second = initialize_checklist_items();
        assert_eq!(second[0].answer, Answer::Unanswered);
    }

    #[test]
    fn test_matches_catalog_rejects_missing_items() {
        let mut items = initialize_checklist_items();
        items.pop();
        assert!(!matches_catalog(&items));
    }

    #[test]
    fn test_definition_lookup() {
        assert_eq!(definition(26).unwrap().description, "Microwaves clean ?");
        assert!(definition(27).is_none());
    }
}
