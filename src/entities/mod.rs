//! Entity type definitions
//!
//! - [`Inspection`] - a daily walk with one answer per checklist item
//! - [`Store`] - reference rows inspections point at
//! - [`checklist`] - the fixed compliance catalog new inspections are built from

pub mod checklist;
pub mod inspection;
pub mod store;

pub use checklist::{initialize_checklist_items, ChecklistItemDefinition, CHECKLIST};
pub use inspection::{Answer, CorrectedBy, Inspection, InspectionItem, InspectionSummary, UserRef};
pub use store::{store_display_name, Store};
