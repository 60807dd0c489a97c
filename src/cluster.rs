//! Geographic clustering of jobs.
//!
//! Single-pass leader clustering: each geocoded job joins the nearest
//! cluster whose centroid lies within the join radius, otherwise it seeds a
//! new cluster. Centroids are the running mean of member coordinates.

use serde::{Deserialize, Serialize};

use crate::haversine::calculate_distance;
use crate::models::{Coordinates, Installation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicCluster {
    pub id: String,
    pub centroid: Coordinates,
    pub job_ids: Vec<String>,
}

impl GeographicCluster {
    fn seed(index: usize, job: &Installation, location: Coordinates) -> Self {
        Self {
            id: format!("cluster-{}", index + 1),
            centroid: location,
            job_ids: vec![job.id.clone()],
        }
    }

    fn absorb(&mut self, job: &Installation, location: Coordinates) {
        let n = self.job_ids.len() as f64;
        self.centroid = Coordinates::new(
            (self.centroid.lat * n + location.lat) / (n + 1.0),
            (self.centroid.lng * n + location.lng) / (n + 1.0),
        );
        self.job_ids.push(job.id.clone());
    }
}

/// Clusters plus the jobs that could not be placed for lack of coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSet {
    pub clusters: Vec<GeographicCluster>,
    pub ungeocoded: Vec<String>,
}

/// Group geocoded jobs by proximity. Every geocoded job lands in exactly one
/// cluster; ungeocoded jobs are reported separately instead of being treated
/// as if they sat at (0,0).
pub fn create_geographic_clusters(jobs: &[&Installation], radius_miles: f64) -> ClusterSet {
    let mut set = ClusterSet::default();

    for job in jobs {
        let Some(location) = job.coordinates else {
            set.ungeocoded.push(job.id.clone());
            continue;
        };

        let nearest = set
            .clusters
            .iter()
            .enumerate()
            .map(|(i, cluster)| (i, calculate_distance(cluster.centroid, location)))
            .filter(|(_, distance)| *distance <= radius_miles)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((i, _)) => set.clusters[i].absorb(job, location),
            None => {
                let index = set.clusters.len();
                set.clusters.push(GeographicCluster::seed(index, job, location));
            }
        }
    }

    tracing::debug!(
        clusters = set.clusters.len(),
        ungeocoded = set.ungeocoded.len(),
        "built geographic clusters"
    );

    set
}
