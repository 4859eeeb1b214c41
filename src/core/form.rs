//! Walk form state and the new/edit controllers
//!
//! A [`WalkForm`] holds in-progress answers. Controllers turn it into service
//! calls: a draft save is always allowed, a submit is checked locally first
//! and rejected before any store call if the form is incomplete.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::core::entity::InspectionStatus;
use crate::core::error::{ValidationFailure, WalkError, WalkResult};
use crate::core::service::{InspectionPatch, InspectionService, NewInspection};
use crate::core::session::{Session, SessionContext};
use crate::entities::{checklist, Answer, CorrectedBy, Inspection, InspectionItem};
use crate::store::DocumentStore;

/// How far along a set of answers is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Empty,
    PartiallyAnswered,
    FullyAnswered,
}

impl Completeness {
    pub fn of(items: &[InspectionItem]) -> Self {
        let answered = items.iter().filter(|i| i.answer.is_answered()).count();
        match answered {
            0 if !items.is_empty() => Completeness::Empty,
            n if n == items.len() => Completeness::FullyAnswered,
            _ => Completeness::PartiallyAnswered,
        }
    }
}

/// Ids of items still waiting for an answer
pub fn unanswered_ids(items: &[InspectionItem]) -> Vec<u32> {
    items
        .iter()
        .filter(|i| !i.answer.is_answered())
        .map(|i| i.id)
        .collect()
}

/// In-progress walk answers
#[derive(Debug, Clone, PartialEq)]
pub struct WalkForm {
    pub store_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub items: Vec<InspectionItem>,
    /// Free-text name of whoever fixed failed items
    pub corrected_by: String,
}

impl WalkForm {
    /// Blank form for a new walk at `now`, store preselected from the user
    pub fn new(user: Option<&Session>, now: NaiveDateTime) -> Self {
        Self {
            store_id: user.and_then(|u| u.store_id.clone()).filter(|s| !s.is_empty()),
            date: now.date(),
            time: NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN),
            items: checklist::initialize_checklist_items(),
            corrected_by: String::new(),
        }
    }

    /// Form prefilled from a stored inspection
    pub fn from_inspection(inspection: &Inspection) -> Self {
        Self {
            store_id: Some(inspection.store_id.clone()).filter(|s| !s.is_empty()),
            date: inspection.date,
            time: inspection.time,
            items: inspection.items.clone(),
            corrected_by: inspection
                .corrected_by
                .as_ref()
                .map(|c| c.display_name().to_string())
                .unwrap_or_default(),
        }
    }

    fn item_mut(&mut self, item_id: u32) -> Result<&mut InspectionItem, ValidationFailure> {
        self.items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or(ValidationFailure::UnknownItem { item_id })
    }

    /// Record pass/fail; switching an item to passed clears its fixed flag
    pub fn answer(&mut self, item_id: u32, passed: bool) -> Result<(), ValidationFailure> {
        let item = self.item_mut(item_id)?;
        item.answer = match (passed, item.answer) {
            (true, _) => Answer::Passed,
            (false, Answer::Failed { fixed }) => Answer::Failed { fixed },
            (false, _) => Answer::Failed { fixed: false },
        };
        Ok(())
    }

    pub fn clear_answer(&mut self, item_id: u32) -> Result<(), ValidationFailure> {
        self.item_mut(item_id)?.answer = Answer::Unanswered;
        Ok(())
    }

    /// Mark or unmark a failed item as fixed
    pub fn set_fixed(&mut self, item_id: u32, fixed: bool) -> Result<(), ValidationFailure> {
        let item = self.item_mut(item_id)?;
        match item.answer {
            Answer::Failed { .. } => {
                item.answer = Answer::Failed { fixed };
                Ok(())
            }
            _ if !fixed => Ok(()),
            _ => Err(ValidationFailure::FixedWithoutFailure { item_id }),
        }
    }

    pub fn set_comments(
        &mut self,
        item_id: u32,
        comments: impl Into<String>,
    ) -> Result<(), ValidationFailure> {
        self.item_mut(item_id)?.comments = comments.into();
        Ok(())
    }

    /// Answer every still-unanswered item as passed
    pub fn pass_remaining(&mut self) {
        for item in self.items.iter_mut().filter(|i| !i.answer.is_answered()) {
            item.answer = Answer::Passed;
        }
    }

    pub fn completeness(&self) -> Completeness {
        Completeness::of(&self.items)
    }

    /// Whether to ask who corrected the failures
    pub fn has_failed_items(&self) -> bool {
        self.items.iter().any(InspectionItem::is_failed)
    }

    fn corrected_by(&self) -> Option<CorrectedBy> {
        let name = self.corrected_by.trim();
        (!name.is_empty()).then(|| CorrectedBy::Name(name.to_string()))
    }

    /// Local submit checks: a store is selected and every item is answered
    pub fn validate_submit(&self) -> Result<(), ValidationFailure> {
        if self.store_id.is_none() {
            return Err(ValidationFailure::NoStoreSelected);
        }
        let missing = unanswered_ids(&self.items);
        if !missing.is_empty() {
            return Err(ValidationFailure::Unanswered { item_ids: missing });
        }
        Ok(())
    }

    fn to_new(&self, status: InspectionStatus) -> NewInspection {
        NewInspection {
            store_id: self.store_id.clone().unwrap_or_default(),
            date: self.date,
            time: self.time,
            items: self.items.clone(),
            status: Some(status),
            corrected_by: self.corrected_by(),
        }
    }

    fn to_patch(&self, status: InspectionStatus, token: DateTime<Utc>) -> InspectionPatch {
        InspectionPatch {
            store_id: Some(self.store_id.clone().unwrap_or_default()),
            date: Some(self.date),
            time: Some(self.time),
            items: Some(self.items.clone()),
            status: Some(status),
            corrected_by: self.corrected_by(),
            expected_updated_at: Some(token),
        }
    }
}

/// Drives the "new walk" flow
pub struct NewWalkController<'a, S> {
    service: &'a InspectionService<S>,
    session: &'a SessionContext,
}

impl<'a, S: DocumentStore> NewWalkController<'a, S> {
    pub fn new(service: &'a InspectionService<S>, session: &'a SessionContext) -> Self {
        Self { service, session }
    }

    /// Blank form for the signed-in user; fails without a session
    pub fn start(&self, now: NaiveDateTime) -> WalkResult<WalkForm> {
        let user = self.session.require()?;
        Ok(WalkForm::new(Some(user), now))
    }

    /// Persist the form as a draft, whatever its completeness
    pub fn save_draft(&self, form: &WalkForm) -> WalkResult<Inspection> {
        let result = self
            .service
            .create_inspection(self.session, form.to_new(InspectionStatus::Draft));
        report(self.service, &result, "Draft Saved", "Failed to save draft. Please try again.");
        result
    }

    /// Persist the form as completed; rejected locally if incomplete
    pub fn submit(&self, form: &WalkForm) -> WalkResult<Inspection> {
        check_submit(self.service, form)?;
        let result = self
            .service
            .create_inspection(self.session, form.to_new(InspectionStatus::Completed));
        report(
            self.service,
            &result,
            "Inspection Submitted",
            "Failed to submit inspection. Please try again.",
        );
        result
    }
}

/// A draft loaded for editing, with the `updatedAt` it was loaded at
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub id: String,
    pub form: WalkForm,
    pub loaded_at: DateTime<Utc>,
}

/// Result of opening an inspection for editing
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Edit(EditSession),
    /// Not a draft; show it read-only instead
    Redirect {
        id: String,
        status: InspectionStatus,
    },
}

/// Drives the "edit draft" flow
pub struct EditController<'a, S> {
    service: &'a InspectionService<S>,
}

impl<'a, S: DocumentStore> EditController<'a, S> {
    pub fn new(service: &'a InspectionService<S>) -> Self {
        Self { service }
    }

    /// Load a draft for editing; non-drafts redirect without any mutation
    pub fn load(&self, id: &str) -> WalkResult<EditOutcome> {
        let inspection = self.service.get_inspection_by_id(id)?;
        if !inspection.status.is_editable() {
            self.service.notifier().error(
                "Cannot Edit",
                Some("Only draft inspections can be edited."),
            );
            return Ok(EditOutcome::Redirect {
                id: inspection.id,
                status: inspection.status,
            });
        }
        Ok(EditOutcome::Edit(EditSession {
            form: WalkForm::from_inspection(&inspection),
            loaded_at: inspection.updated_at,
            id: inspection.id,
        }))
    }

    /// Save the draft; the session's token advances so it can be saved again
    pub fn save_draft(&self, edit: &mut EditSession) -> WalkResult<Inspection> {
        let result = self.service.update_inspection(
            &edit.id,
            edit.form.to_patch(InspectionStatus::Draft, edit.loaded_at),
        );
        report(
            self.service,
            &result,
            "Draft Saved",
            "Failed to save draft. Please try again.",
        );
        let updated = result?;
        edit.loaded_at = updated.updated_at;
        Ok(updated)
    }

    /// Complete the draft; rejected locally if incomplete
    pub fn submit(&self, edit: &EditSession) -> WalkResult<Inspection> {
        check_submit(self.service, &edit.form)?;
        let result = self.service.update_inspection(
            &edit.id,
            edit.form.to_patch(InspectionStatus::Completed, edit.loaded_at),
        );
        report(
            self.service,
            &result,
            "Inspection Submitted",
            "Failed to submit inspection. Please try again.",
        );
        result
    }
}

fn check_submit<S: DocumentStore>(
    service: &InspectionService<S>,
    form: &WalkForm,
) -> WalkResult<()> {
    form.validate_submit().map_err(|failure| {
        service
            .notifier()
            .error("Validation Error", Some(&failure.to_string()));
        WalkError::from(failure)
    })
}

fn report<S: DocumentStore>(
    service: &InspectionService<S>,
    result: &WalkResult<Inspection>,
    success: &str,
    failure: &str,
) {
    match result {
        Ok(_) => service.notifier().success(success, None),
        Err(_) => service.notifier().error("Error", Some(failure)),
    }
}
