use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel company name used when the referenced company cannot be resolved.
pub const UNKNOWN_COMPANY: &str = "Desconocida";

/// A quality inspection persisted for a company.
///
/// `company_name` is resolved at read time by the storage layer; a `None`
/// here means the referenced company row could not be found.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub company_id: i64,
    pub company_name: Option<String>,
    pub score: i64,
    pub notes: Option<String>,
    pub inspector: String,
}

impl Inspection {
    /// Produces the display-ready record served over the API.
    ///
    /// The wire vocabulary is Spanish (the public contract of the service);
    /// the date collapses to `YYYY-MM-DD`.
    pub fn to_record(&self) -> InspectionRecord {
        InspectionRecord {
            id: self.id,
            date: self.date.format("%Y-%m-%d").to_string(),
            company_id: self.company_id,
            company_name: self
                .company_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
            score: self.score,
            notes: self.notes.clone(),
            inspector: self.inspector.clone(),
        }
    }
}

/// Wire representation of an inspection as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: i64,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "empresa_id")]
    pub company_id: i64,
    #[serde(rename = "empresa_nombre")]
    pub company_name: String,
    #[serde(rename = "puntaje")]
    pub score: i64,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    pub inspector: String,
}

/// Incoming registration payload, prior to validation.
///
/// `score` defaults to 0 when the field is absent so that a missing score
/// fails the range rule rather than the body parser.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectionDraft {
    #[serde(rename = "empresa_id")]
    pub company_id: i64,
    #[serde(rename = "puntaje", default)]
    pub score: i64,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(default)]
    pub inspector: Option<String>,
}
