//! Density-based clustering (DBSCAN) over cosine distance, backed by `linfa-clustering`.

use linfa::ParamGuard;
use linfa::traits::Transformer;
use linfa_clustering::Dbscan;
use ndarray::Array2;

use super::error::{BatchProcessingError, BatchResult};

/// Cluster assignment for a set of points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    /// Cluster index per point; `None` is noise.
    pub labels: Vec<Option<usize>>,
    pub cluster_count: usize,
}

impl Clustering {
    fn all_noise(n: usize) -> Self {
        Self {
            labels: vec![None; n],
            cluster_count: 0,
        }
    }

    /// Point indices per cluster, in cluster order.
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new(); self.cluster_count];
        for (point, label) in self.labels.iter().enumerate() {
            if let Some(cluster) = label {
                out[*cluster].push(point);
            }
        }
        out
    }

    pub fn noise(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }
}

/// Euclidean radius between unit vectors whose cosine distance is `eps`.
///
/// For unit vectors `|a - b|² = 2 (1 - cos)`.
pub fn euclidean_tolerance(eps: f32) -> f32 {
    (2.0 * eps).sqrt()
}

/// Clusters `points` with DBSCAN.
///
/// Two points are neighbours when their cosine distance `1 - cos` is at most `eps`.
/// A point is a core point when its neighbourhood, itself included, holds at least
/// `min_samples` points. Points reachable from no core point are noise.
///
/// Points are L2-normalized and handed to linfa's Euclidean DBSCAN with the
/// matching radius. Zero vectors stay at the origin and end up as noise unless
/// `eps` is wide enough to reach them.
pub fn dbscan(points: &[Vec<f32>], eps: f32, min_samples: usize) -> BatchResult<Clustering> {
    let n = points.len();
    if n == 0 || n < min_samples {
        return Ok(Clustering::all_noise(n));
    }

    let dim = points[0].len();
    let mut flat = Vec::with_capacity(n * dim);
    for point in points {
        if point.len() != dim {
            return Err(BatchProcessingError::Clustering {
                reason: format!("mixed dimensions {} and {}", dim, point.len()),
            });
        }
        let norm = point.iter().map(|x| x * x).sum::<f32>().sqrt();
        let scale = if norm > 0.0 && norm.is_finite() { norm } else { 1.0 };
        flat.extend(point.iter().map(|x| if x.is_finite() { x / scale } else { 0.0 }));
    }
    let observations =
        Array2::from_shape_vec((n, dim), flat).map_err(|e| BatchProcessingError::Clustering {
            reason: e.to_string(),
        })?;

    let params = Dbscan::params(min_samples)
        .tolerance(euclidean_tolerance(eps))
        .check()
        .map_err(|e| BatchProcessingError::Clustering {
            reason: e.to_string(),
        })?;
    let memberships = params.transform(&observations);

    let labels: Vec<Option<usize>> = memberships.iter().copied().collect();
    let cluster_count = labels.iter().flatten().map(|c| c + 1).max().unwrap_or(0);
    Ok(Clustering {
        labels,
        cluster_count,
    })
}
