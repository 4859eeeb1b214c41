//! Inspection service - create, fetch and mutate inspection records
//!
//! Every operation logs its failure with `tracing` and hands it back to the
//! caller. Audit metadata (`inspectedBy`, `createdAt`, `updatedAt`) is stamped
//! here, never by callers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::core::entity::{clock_time, timestamp, Entity, InspectionStatus};
use crate::core::error::{ValidationFailure, WalkError, WalkResult};
use crate::core::notify::{Notifier, SilentNotifier};
use crate::core::session::{Session, SessionContext};
use crate::entities::checklist::{self, matches_catalog};
use crate::entities::{CorrectedBy, Inspection, InspectionItem, Store};
use crate::store::{Collection, Document, DocumentStore, Query, StoreError};

/// Default cap on `get_inspections` results
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// What `get_stores_with` does when the stores collection cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFallback {
    /// Return the error to the caller
    #[default]
    Propagate,
    /// Log, notify, and return a single placeholder store
    Placeholder,
}

impl std::str::FromStr for StoreFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "propagate" => Ok(StoreFallback::Propagate),
            "placeholder" => Ok(StoreFallback::Placeholder),
            _ => Err(format!(
                "Unknown store fallback: {}. Use propagate or placeholder",
                s
            )),
        }
    }
}

/// Input for a new inspection
#[derive(Debug, Clone, PartialEq)]
pub struct NewInspection {
    pub store_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub items: Vec<InspectionItem>,
    /// Defaults to draft
    pub status: Option<InspectionStatus>,
    pub corrected_by: Option<CorrectedBy>,
}

/// Fields to merge over an existing inspection; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionPatch {
    pub store_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub items: Option<Vec<InspectionItem>>,
    pub status: Option<InspectionStatus>,
    pub corrected_by: Option<CorrectedBy>,
    /// When set, the update is refused unless the stored `updatedAt` matches
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl InspectionPatch {
    fn to_document(&self) -> Result<Document, StoreError> {
        let mut doc = Document::new();
        if let Some(store_id) = &self.store_id {
            doc.insert("storeId".to_string(), Value::String(store_id.clone()));
        }
        if let Some(date) = self.date {
            doc.insert(
                "date".to_string(),
                Value::String(date.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(time) = self.time {
            doc.insert(
                "time".to_string(),
                Value::String(time.format(clock_time::FORMAT).to_string()),
            );
        }
        if let Some(items) = &self.items {
            doc.insert("items".to_string(), encode(items)?);
        }
        if let Some(status) = self.status {
            doc.insert("status".to_string(), encode(&status)?);
        }
        if let Some(corrected_by) = &self.corrected_by {
            doc.insert("correctedBy".to_string(), encode(corrected_by)?);
        }
        Ok(doc)
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Encode(e.to_string()))
}

fn timestamp_value(dt: &DateTime<Utc>) -> Value {
    Value::String(timestamp::format(dt))
}

/// Inspection operations against a document store
pub struct InspectionService<S> {
    store: S,
    notifier: Box<dyn Notifier>,
}

impl<S: DocumentStore> InspectionService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            notifier: Box::new(SilentNotifier),
        }
    }

    /// Route notices (such as "Demo store created") to `notifier`
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Fresh unanswered items for a new draft
    pub fn initialize_checklist_items() -> Vec<InspectionItem> {
        checklist::initialize_checklist_items()
    }

    /// Persist a new inspection stamped with the current user
    pub fn create_inspection(
        &self,
        session: &SessionContext,
        data: NewInspection,
    ) -> WalkResult<Inspection> {
        self.try_create(session, data)
            .inspect_err(|e| error!(error = %e, "error creating inspection"))
    }

    fn try_create(&self, session: &SessionContext, data: NewInspection) -> WalkResult<Inspection> {
        let user = session.require()?;

        if !matches_catalog(&data.items) {
            return Err(ValidationFailure::CatalogMismatch {
                expected: checklist::CHECKLIST.len(),
            }
            .into());
        }

        let now = self.store.server_timestamp();
        let mut inspection = Inspection {
            id: String::new(),
            store_id: data.store_id,
            date: data.date,
            time: data.time,
            items: data.items,
            status: data.status.unwrap_or_default(),
            inspected_by: user.user_ref(),
            corrected_by: data.corrected_by,
            created_at: now,
            updated_at: now,
        };

        let id = self
            .store
            .add(Collection::Inspections, inspection.to_document()?)?;
        inspection.set_id(id);

        info!(
            id = %inspection.id,
            store = %inspection.store_id,
            status = %inspection.status,
            "created inspection"
        );
        Ok(inspection)
    }

    /// Newest inspections first, optionally for one store, at most `limit`
    pub fn get_inspections(
        &self,
        session: &SessionContext,
        store_id: Option<&str>,
        limit: usize,
    ) -> WalkResult<Vec<Inspection>> {
        self.try_list(session, store_id, limit)
            .inspect_err(|e| error!(error = %e, "error getting inspections"))
    }

    fn try_list(
        &self,
        session: &SessionContext,
        store_id: Option<&str>,
        limit: usize,
    ) -> WalkResult<Vec<Inspection>> {
        session.require()?;

        let mut query = Query::new().order_by_desc("createdAt").limit(limit);
        if let Some(store_id) = store_id {
            query = query.where_eq("storeId", store_id);
        }
        debug!(?query, "listing inspections");

        self.store
            .query(Collection::Inspections, &query)?
            .into_iter()
            .map(|(id, doc)| Inspection::from_document(&id, doc).map_err(WalkError::from))
            .collect()
    }

    pub fn get_inspection_by_id(&self, id: &str) -> WalkResult<Inspection> {
        self.try_get(id)
            .inspect_err(|e| error!(id, error = %e, "error getting inspection"))
    }

    fn try_get(&self, id: &str) -> WalkResult<Inspection> {
        match self.store.get(Collection::Inspections, id)? {
            Some(doc) => Ok(Inspection::from_document(id, doc)?),
            None => Err(WalkError::NotFound { id: id.to_string() }),
        }
    }

    /// Merge `patch` over a stored inspection and refresh `updatedAt`
    ///
    /// Whether the inspection may still be edited is the caller's decision.
    pub fn update_inspection(&self, id: &str, patch: InspectionPatch) -> WalkResult<Inspection> {
        self.try_update(id, patch)
            .inspect_err(|e| error!(id, error = %e, "error updating inspection"))
    }

    fn try_update(&self, id: &str, patch: InspectionPatch) -> WalkResult<Inspection> {
        let Some(mut doc) = self.store.get(Collection::Inspections, id)? else {
            return Err(WalkError::NotFound { id: id.to_string() });
        };

        if let Some(expected) = patch.expected_updated_at {
            let current = Inspection::from_document(id, doc.clone())?;
            if current.updated_at != expected {
                return Err(WalkError::Conflict {
                    id: id.to_string(),
                    expected,
                    actual: current.updated_at,
                });
            }
        }

        let mut changes = patch.to_document()?;
        changes.insert(
            "updatedAt".to_string(),
            timestamp_value(&self.store.server_timestamp()),
        );

        self.store
            .update(Collection::Inspections, id, changes.clone())
            .map_err(|e| missing_to_not_found(e, id))?;

        crate::store::merge(&mut doc, changes);
        let updated = Inspection::from_document(id, doc)?;
        debug!(id, status = %updated.status, "updated inspection");
        Ok(updated)
    }

    /// Mark an inspection completed, recording who corrected failures if given
    pub fn complete_inspection(&self, id: &str, corrected_by: Option<&Session>) -> WalkResult<()> {
        self.try_complete(id, corrected_by)
            .inspect_err(|e| error!(id, error = %e, "error completing inspection"))
    }

    fn try_complete(&self, id: &str, corrected_by: Option<&Session>) -> WalkResult<()> {
        let current = self.try_get(id)?;
        // Completing twice only refreshes the timestamp and corrector
        if current.status != InspectionStatus::Completed
            && !current.status.can_transition_to(InspectionStatus::Completed)
        {
            return Err(ValidationFailure::InvalidTransition {
                from: current.status.to_string(),
                to: InspectionStatus::Completed.to_string(),
            }
            .into());
        }

        let mut changes = Document::new();
        changes.insert("status".to_string(), encode(&InspectionStatus::Completed)?);
        changes.insert(
            "updatedAt".to_string(),
            timestamp_value(&self.store.server_timestamp()),
        );
        if let Some(user) = corrected_by {
            changes.insert(
                "correctedBy".to_string(),
                encode(&CorrectedBy::User(user.user_ref()))?,
            );
        }

        self.store
            .update(Collection::Inspections, id, changes)
            .map_err(|e| missing_to_not_found(e, id))?;
        info!(id, "completed inspection");
        Ok(())
    }

    /// All stores, seeding one demo row into an empty collection first
    pub fn get_stores(&self) -> WalkResult<Vec<Store>> {
        self.try_stores()
            .inspect_err(|e| error!(error = %e, "error getting stores"))
    }

    /// Like [`get_stores`](Self::get_stores), with an explicit failure policy
    pub fn get_stores_with(&self, policy: StoreFallback) -> WalkResult<Vec<Store>> {
        match (self.get_stores(), policy) {
            (Ok(stores), _) => Ok(stores),
            (Err(e), StoreFallback::Propagate) => Err(e),
            (Err(e), StoreFallback::Placeholder) => {
                warn!(error = %e, "substituting placeholder store");
                self.notifier
                    .error("Failed to load stores", Some(&e.to_string()));
                Ok(vec![Store::placeholder()])
            }
        }
    }

    fn try_stores(&self) -> WalkResult<Vec<Store>> {
        let existing = self.store.query(Collection::Stores, &Query::new().limit(1))?;
        if existing.is_empty() {
            let demo = Store::demo(self.store.server_timestamp());
            let id = self.store.add(Collection::Stores, demo.to_document()?)?;
            info!(id = %id, "seeded demo store");
            self.notifier.success("Demo store created", None);
        }

        let mut stores = self
            .store
            .query(Collection::Stores, &Query::new())?
            .into_iter()
            .map(|(id, doc)| Store::from_document(&id, doc))
            .collect::<Result<Vec<_>, _>>()?;
        stores.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(stores)
    }

    /// Register a store row
    pub fn add_store(&self, name: &str, location: Option<&str>) -> WalkResult<Store> {
        let mut store = Store {
            id: String::new(),
            name: name.to_string(),
            location: location.map(str::to_string),
            created_at: Some(self.store.server_timestamp()),
        };
        let id = self
            .store
            .add(Collection::Stores, store.to_document()?)
            .inspect_err(|e| error!(error = %e, "error adding store"))?;
        store.set_id(id);
        info!(id = %store.id, name, "added store");
        Ok(store)
    }
}

fn missing_to_not_found(err: StoreError, id: &str) -> WalkError {
    match err {
        StoreError::Missing { .. } => WalkError::NotFound { id: id.to_string() },
        other => WalkError::StoreUnavailable(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::RecordingNotifier;
    use crate::entities::Answer;
    use crate::store::MemoryStore;
    use std::rc::Rc;

    fn session() -> SessionContext {
        SessionContext::signed_in(Session::new("u1").with_display_name("Dana"))
    }

    fn new_walk(store_id: &str) -> NewInspection {
        NewInspection {
            store_id: store_id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            items: InspectionService::<MemoryStore>::initialize_checklist_items(),
            status: None,
            corrected_by: None,
        }
    }

    #[test]
    fn test_create_requires_session() {
        let service = InspectionService::new(MemoryStore::new());
        let err = service
            .create_inspection(&SessionContext::anonymous(), new_walk("S1"))
            .unwrap_err();
        assert!(matches!(err, WalkError::Authentication));
        assert_eq!(service.store().count(Collection::Inspections), 0);
    }

    #[test]
    fn test_create_stamps_metadata_and_defaults_to_draft() {
        let service = InspectionService::new(MemoryStore::new());
        let created = service.create_inspection(&session(), new_walk("S1")).unwrap();

        assert!(created.id.starts_with("INSP-"));
        assert_eq!(created.status, InspectionStatus::Draft);
        assert_eq!(created.inspected_by.user_id, "u1");
        assert_eq!(created.inspected_by.name, "Dana");
        assert_eq!(created.created_at, created.updated_at);

        let loaded = service.get_inspection_by_id(&created.id).unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_create_keeps_explicit_status() {
        let service = InspectionService::new(MemoryStore::new());
        let mut data = new_walk("S1");
        data.status = Some(InspectionStatus::Completed);
        let created = service.create_inspection(&session(), data).unwrap();
        assert_eq!(created.status, InspectionStatus::Completed);
    }

    #[test]
    fn test_create_rejects_items_not_matching_catalog() {
        let service = InspectionService::new(MemoryStore::new());
        let mut data = new_walk("S1");
        data.items.truncate(10);
        let err = service.create_inspection(&session(), data).unwrap_err();
        assert!(matches!(
            err,
            WalkError::Validation(ValidationFailure::CatalogMismatch { expected: 26 })
        ));
    }

    #[test]
    fn test_get_inspections_newest_first_filtered_and_limited() {
        let service = InspectionService::new(MemoryStore::new());
        let a = service.create_inspection(&session(), new_walk("S1")).unwrap();
        let _b = service.create_inspection(&session(), new_walk("S2")).unwrap();
        let c = service.create_inspection(&session(), new_walk("S1")).unwrap();

        let all = service
            .get_inspections(&session(), None, DEFAULT_LIST_LIMIT)
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, c.id);

        let s1 = service.get_inspections(&session(), Some("S1"), 50).unwrap();
        let ids: Vec<&str> = s1.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), a.id.as_str()]);

        let limited = service.get_inspections(&session(), None, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_get_inspections_requires_session() {
        let service = InspectionService::new(MemoryStore::new());
        let err = service
            .get_inspections(&SessionContext::anonymous(), None, 50)
            .unwrap_err();
        assert!(matches!(err, WalkError::Authentication));
    }

    #[test]
    fn test_get_by_id_not_found() {
        let service = InspectionService::new(MemoryStore::new());
        let err = service.get_inspection_by_id("INSP-missing").unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_update_merges_and_refreshes_updated_at() {
        let service = InspectionService::new(MemoryStore::new());
        let created = service.create_inspection(&session(), new_walk("S1")).unwrap();

        let mut items = created.items.clone();
        items[0].answer = Answer::Failed { fixed: true };
        let updated = service
            .update_inspection(
                &created.id,
                InspectionPatch {
                    items: Some(items),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.store_id, "S1");
        assert!(updated.items[0].fixed());

        let reloaded = service.get_inspection_by_id(&created.id).unwrap();
        assert_eq!(reloaded, updated);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let service = InspectionService::new(MemoryStore::new());
        let err = service
            .update_inspection("INSP-missing", InspectionPatch::default())
            .unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_update_with_stale_token_conflicts() {
        let service = InspectionService::new(MemoryStore::new());
        let created = service.create_inspection(&session(), new_walk("S1")).unwrap();

        service
            .update_inspection(&created.id, InspectionPatch::default())
            .unwrap();

        let err = service
            .update_inspection(
                &created.id,
                InspectionPatch {
                    status: Some(InspectionStatus::Completed),
                    expected_updated_at: Some(created.updated_at),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, WalkError::Conflict { .. }));
        let reloaded = service.get_inspection_by_id(&created.id).unwrap();
        assert_eq!(reloaded.status, InspectionStatus::Draft);
    }

    #[test]
    fn test_complete_attaches_corrector_only_when_given() {
        let service = InspectionService::new(MemoryStore::new());
        let a = service.create_inspection(&session(), new_walk("S1")).unwrap();
        let b = service.create_inspection(&session(), new_walk("S1")).unwrap();

        service.complete_inspection(&a.id, None).unwrap();
        let fixer = Session::new("u9").with_email("fixer@example.com");
        service.complete_inspection(&b.id, Some(&fixer)).unwrap();

        let a = service.get_inspection_by_id(&a.id).unwrap();
        assert_eq!(a.status, InspectionStatus::Completed);
        assert!(a.corrected_by.is_none());

        let b = service.get_inspection_by_id(&b.id).unwrap();
        assert_eq!(
            b.corrected_by,
            Some(CorrectedBy::User(crate::entities::UserRef {
                user_id: "u9".to_string(),
                name: "fixer@example.com".to_string(),
            }))
        );
    }

    #[test]
    fn test_complete_follows_status_transitions() {
        let service = InspectionService::new(MemoryStore::new());
        let walk = service.create_inspection(&session(), new_walk("S1")).unwrap();

        service.complete_inspection(&walk.id, None).unwrap();
        service.complete_inspection(&walk.id, None).unwrap();

        service
            .update_inspection(
                &walk.id,
                InspectionPatch {
                    status: Some(InspectionStatus::Reviewed),
                    ..Default::default()
                },
            )
            .unwrap();
        let err = service.complete_inspection(&walk.id, None).unwrap_err();
        assert!(matches!(
            err,
            WalkError::Validation(ValidationFailure::InvalidTransition { .. })
        ));
        assert_eq!(
            service.get_inspection_by_id(&walk.id).unwrap().status,
            InspectionStatus::Reviewed
        );
    }

    #[test]
    fn test_complete_missing_is_not_found() {
        let service = InspectionService::new(MemoryStore::new());
        let err = service.complete_inspection("INSP-missing", None).unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_get_stores_seeds_exactly_once() {
        let notifier = Rc::new(RecordingNotifier::new());
        let service = InspectionService::new(MemoryStore::new()).with_notifier(notifier.clone());

        let first = service.get_stores().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "Store #123");
        assert_eq!(first[0].location.as_deref(), Some("Main Street"));

        let second = service.get_stores().unwrap();
        assert_eq!(second, first);
        assert_eq!(service.store().count(Collection::Stores), 1);
        assert_eq!(notifier.titles(), vec!["Demo store created".to_string()]);
    }

    #[test]
    fn test_get_stores_does_not_seed_populated_collection() {
        let service = InspectionService::new(MemoryStore::new());
        service.add_store("Uptown", None).unwrap();
        let stores = service.get_stores().unwrap();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].name, "Uptown");
    }

    #[test]
    fn test_store_failure_policy() {
        let notifier = Rc::new(RecordingNotifier::new());
        let service = InspectionService::new(MemoryStore::new()).with_notifier(notifier.clone());
        service.store().set_unavailable(true);

        let err = service.get_stores_with(StoreFallback::Propagate).unwrap_err();
        assert!(matches!(err, WalkError::StoreUnavailable(_)));

        let stores = service.get_stores_with(StoreFallback::Placeholder).unwrap();
        assert_eq!(stores, vec![Store::placeholder()]);
        assert_eq!(notifier.titles(), vec!["Failed to load stores".to_string()]);
    }
}
