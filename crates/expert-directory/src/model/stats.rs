use super::{Expert, ExpertRequest, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate figures shown on the directory dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryStats {
    pub total_experts: usize,
    pub available_count: usize,
    pub published_count: usize,
    /// `published_count / total_experts`, or `0.0` for an empty directory.
    pub published_ratio: f64,
    pub pending_requests: usize,
    /// Expert count per area, ordered by area name.
    pub experts_by_area: BTreeMap<String, usize>,
}

impl DirectoryStats {
    pub fn compute(experts: &[Expert], requests: &[ExpertRequest]) -> Self {
        let total_experts = experts.len();
        let published_count = experts.iter().filter(|e| e.is_published).count();
        let mut experts_by_area = BTreeMap::new();
        for area in experts.iter().flat_map(|e| &e.areas) {
            *experts_by_area.entry(area.clone()).or_insert(0) += 1;
        }

        Self {
            total_experts,
            available_count: experts.iter().filter(|e| e.is_available).count(),
            published_count,
            published_ratio: if total_experts == 0 {
                0.0
            } else {
                published_count as f64 / total_experts as f64
            },
            pending_requests: requests
                .iter()
                .filter(|r| r.status == RequestStatus::Pending)
                .count(),
            experts_by_area,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_directory_has_zero_ratio() {
        let stats = DirectoryStats::compute(&[], &[]);
        assert_eq!(stats, DirectoryStats::default());
    }

    #[test]
    fn counts_published_available_and_areas() {
        let mut published = Expert::new("A", "UoB", "Professor").with_areas(["Energy", "Water"]);
        published.is_published = true;
        let mut away = Expert::new("B", "Polytechnic", "Lecturer").with_areas(["Energy"]);
        away.is_available = false;
        let mut approved = ExpertRequest::new("C", "BIBF");
        approved.status = RequestStatus::Approved;

        let stats = DirectoryStats::compute(&[published, away], &[approved, ExpertRequest::new("D", "UoB")]);

        assert_eq!(stats.total_experts, 2);
        assert_eq!(stats.available_count, 1);
        assert_eq!(stats.published_count, 1);
        assert_eq!(stats.published_ratio, 0.5);
        assert_eq!(stats.pending_requests, 1);
        assert_eq!(stats.experts_by_area["Energy"], 2);
        assert_eq!(stats.experts_by_area["Water"], 1);
    }
}
