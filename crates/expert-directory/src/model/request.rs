use crate::store::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use sync_framework::Entity;

/// Type-safe identifier for expert requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A submission asking for a new expert to be added to the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRequest {
    pub id: RequestId,
    pub name: String,
    pub affiliation: String,
    pub status: RequestStatus,
}

impl ExpertRequest {
    pub fn new(name: impl Into<String>, affiliation: impl Into<String>) -> Self {
        Self {
            id: RequestId(0),
            name: name.into(),
            affiliation: affiliation.into(),
            status: RequestStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

impl Entity for ExpertRequest {
    type Id = RequestId;

    fn id(&self) -> &RequestId {
        &self.id
    }
}

impl Record for ExpertRequest {
    fn assign_id(&mut self, seq: u64) {
        self.id = RequestId(seq);
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("request name is required".to_string());
        }
        Ok(())
    }
}

/// A reviewer's decision on one request, carrying the request as it was
/// before the decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub request: ExpertRequest,
    pub decision: RequestStatus,
}

impl Review {
    pub fn approve(request: ExpertRequest) -> Self {
        Self {
            request,
            decision: RequestStatus::Approved,
        }
    }

    pub fn reject(request: ExpertRequest) -> Self {
        Self {
            request,
            decision: RequestStatus::Rejected,
        }
    }

    /// The request with the decision applied.
    pub fn decided(&self) -> ExpertRequest {
        ExpertRequest {
            status: self.decision,
            ..self.request.clone()
        }
    }
}
