use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use inspecta_core::{validate_draft, Inspection, InspectionDraft, ValidationError};
use inspecta_storage::{Database, InspectionError, NewInspection};

/// Business layer sitting between the HTTP handlers and the repository.
///
/// The clock is injected so tests can pin the registration date.
#[derive(Clone)]
pub struct InspectionService {
    database: Database,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl InspectionService {
    pub fn new(database: Database, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        Self { database, clock }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Returns every recorded inspection.
    pub async fn list_all(&self) -> Result<Vec<Inspection>, InspectionError> {
        self.database.inspections().list_all().await
    }

    /// Validates the draft and persists it, stamping the current instant as
    /// the inspection date.
    pub async fn register(&self, draft: &InspectionDraft) -> Result<Inspection, RegisterError> {
        validate_draft(draft)?;

        let record = NewInspection {
            company_id: draft.company_id,
            score: draft.score,
            notes: draft.notes.as_deref(),
            // validate_draft guarantees a non-empty inspector
            inspector: draft.inspector.as_deref().unwrap_or_default(),
            date: self.now(),
        };

        Ok(self.database.inspections().create(record).await?)
    }

    /// Removes an inspection; `false` means no row carried the id.
    pub async fn delete(&self, id: i64) -> Result<bool, InspectionError> {
        self.database.inspections().delete_by_id(id).await
    }
}

/// Errors surfaced by [`InspectionService::register`].
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] InspectionError),
}
