//! Cluster heuristic over high-priority object positions

use std::collections::BTreeSet;

use crate::core::types::PixelPoint;

/// Result of the pairwise proximity scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterScan {
    /// Unordered pairs closer than the radius
    pub close_pairs: usize,
    /// Distinct objects taking part in at least one close pair
    pub participants: usize,
}

impl ClusterScan {
    pub fn is_cluster(&self, min_pairs: usize, min_objects: usize) -> bool {
        self.close_pairs >= min_pairs && self.participants >= min_objects
    }
}

/// Count unordered pairs of centers strictly closer than `radius_px`
pub fn scan_clusters(centers: &[PixelPoint], radius_px: f64) -> ClusterScan {
    let mut close_pairs = 0;
    let mut participants = BTreeSet::new();

    for (i, a) in centers.iter().enumerate() {
        for (j, b) in centers.iter().enumerate().skip(i + 1) {
            if a.distance(b) < radius_px {
                close_pairs += 1;
                participants.insert(i);
                participants.insert(j);
            }
        }
    }

    ClusterScan {
        close_pairs,
        participants: participants.len(),
    }
}
