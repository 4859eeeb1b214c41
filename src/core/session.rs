//! The signed-in inspector, passed explicitly into service calls

use serde::{Deserialize, Serialize};

use crate::core::error::{WalkError, WalkResult};
use crate::entities::UserRef;

/// Identity of the current user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// Store the user normally walks, preselected in new inspections
    pub store_id: Option<String>,
}

impl Session {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Name shown on records: display name, else email, else uid
    pub fn display(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.email.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(&self.uid)
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef {
            user_id: self.uid.clone(),
            name: self.display().to_string(),
        }
    }
}

/// The session state a caller runs under; empty when nobody is signed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn signed_in(session: Session) -> Self {
        Self {
            current: Some(session),
        }
    }

    pub fn anonymous() -> Self {
        Self { current: None }
    }

    pub fn current_user(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current user, or [`WalkError::Authentication`]
    pub fn require(&self) -> WalkResult<&Session> {
        self.current.as_ref().ok_or(WalkError::Authentication)
    }
}
