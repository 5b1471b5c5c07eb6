//! Domain layer for the inspection registry.
//!
//! Hosts the inspection entity, its wire-format records, and the business
//! rules applied before a registration reaches storage. The crate performs
//! no I/O; storage access lives in `inspecta-storage` and orchestration in
//! the application crate.

pub mod types;
pub mod validate;

pub use types::{Inspection, InspectionDraft, InspectionRecord, UNKNOWN_COMPANY};
pub use validate::{validate_draft, ValidationError};
