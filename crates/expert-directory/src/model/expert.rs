//! An expert profile in the directory.
//!
//! # Sync Framework
//! [`Expert`] implements [`Entity`] so it can be mirrored by an
//! [`OptimisticCollection`](sync_framework::OptimisticCollection), and
//! [`Record`] so a [`RemoteStore`](crate::store::RemoteStore) can own it.

use crate::store::Record;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use sync_framework::Entity;

/// Type-safe identifier for Experts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExpertId(pub u64);

impl From<u64> for ExpertId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ExpertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expert_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub id: ExpertId,
    pub name: String,
    pub affiliation: String,
    pub designation: String,
    pub areas: Vec<String>,
    pub is_available: bool,
    pub is_published: bool,
}

impl Expert {
    /// Creates an unpublished, available expert.
    ///
    /// The id is a placeholder until the store assigns one.
    pub fn new(name: impl Into<String>, affiliation: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            id: ExpertId(0),
            name: name.into(),
            affiliation: affiliation.into(),
            designation: designation.into(),
            areas: Vec::new(),
            is_available: true,
            is_published: false,
        }
    }

    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
        self
    }
}

impl Entity for Expert {
    type Id = ExpertId;

    fn id(&self) -> &ExpertId {
        &self.id
    }
}

impl Record for Expert {
    fn assign_id(&mut self, seq: u64) {
        self.id = ExpertId(seq);
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("expert name is required".to_string());
        }
        if self.affiliation.trim().is_empty() {
            return Err("expert affiliation is required".to_string());
        }
        Ok(())
    }
}
