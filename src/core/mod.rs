//! Core module - fundamental types, the inspection service and its controllers

pub mod config;
pub mod entity;
pub mod error;
pub mod filter;
pub mod form;
pub mod identity;
pub mod notify;
pub mod project;
pub mod service;
pub mod session;
pub mod shortid;
pub mod stats;

pub use config::Config;
pub use entity::{Entity, InspectionStatus};
pub use error::{ValidationFailure, WalkError, WalkResult};
pub use filter::InspectionFilter;
pub use form::{Completeness, EditController, EditOutcome, EditSession, NewWalkController, WalkForm};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use notify::{ConsoleNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier, SilentNotifier};
pub use project::{Project, ProjectError};
pub use service::{InspectionPatch, InspectionService, NewInspection, StoreFallback};
pub use session::{Session, SessionContext};
pub use shortid::ShortIdIndex;
pub use stats::{StoreStats, WalkStats};
