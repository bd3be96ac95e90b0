use serde::{Deserialize, Serialize};

use crate::geom::error::{GeomError, GeomResult};

/// Non-spatial map axis, binned by edges. Used for energy (TeV).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapAxis {
    name: String,
    edges: Vec<f64>,
    unit: String,
}

impl MapAxis {
    pub fn from_edges(edges: Vec<f64>, name: &str, unit: &str) -> GeomResult<Self> {
        if edges.len() < 2 {
            return Err(GeomError::InvalidAxis(format!(
                "axis {name:?} needs at least two edges"
            )));
        }
        if edges.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(GeomError::InvalidAxis(format!(
                "axis {name:?} edges must be strictly increasing"
            )));
        }
        if edges[0] <= 0.0 {
            return Err(GeomError::InvalidAxis(format!(
                "axis {name:?} edges must be positive for log nodes"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            edges,
            unit: unit.to_string(),
        })
    }

    /// Log-spaced energy axis in TeV.
    pub fn energy_from_bounds(emin_tev: f64, emax_tev: f64, nbin: usize) -> GeomResult<Self> {
        if nbin == 0 || emin_tev <= 0.0 || emax_tev <= emin_tev {
            return Err(GeomError::InvalidAxis(format!(
                "invalid energy bounds [{emin_tev}, {emax_tev}] with {nbin} bins"
            )));
        }
        let log_min = emin_tev.ln();
        let step = (emax_tev.ln() - log_min) / nbin as f64;
        let edges = (0..=nbin)
            .map(|i| (log_min + step * i as f64).exp())
            .collect();
        Self::from_edges(edges, "energy", "TeV")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn nbin(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edge_min(&self) -> f64 {
        self.edges[0]
    }

    pub fn edge_max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Log-center of bin `idx`.
    pub fn center(&self, idx: usize) -> f64 {
        (self.edges[idx] * self.edges[idx + 1]).sqrt()
    }

    pub fn centers(&self) -> Vec<f64> {
        (0..self.nbin()).map(|idx| self.center(idx)).collect()
    }

    pub fn bin_width(&self, idx: usize) -> f64 {
        self.edges[idx + 1] - self.edges[idx]
    }

    /// Bin containing `value`, using half-open `[lo, hi)` bins.
    pub fn coord_to_idx(&self, value: f64) -> Option<usize> {
        if !(value >= self.edge_min() && value < self.edge_max()) {
            return None;
        }
        let upper = self.edges.partition_point(|&edge| edge <= value);
        Some(upper - 1)
    }

    /// Single-bin axis spanning the full range of this one.
    pub fn squash(&self) -> Self {
        Self {
            name: self.name.clone(),
            edges: vec![self.edge_min(), self.edge_max()],
            unit: self.unit.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn log_axis_has_expected_edges() {
        let axis = MapAxis::energy_from_bounds(1.0, 100.0, 2).unwrap();
        assert_eq!(axis.nbin(), 2);
        assert_abs_diff_eq!(axis.edges()[1], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(axis.center(0), 10f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn coord_to_idx_uses_half_open_bins() {
        let axis = MapAxis::from_edges(vec![1.0, 2.0, 4.0], "energy", "TeV").unwrap();
        assert_eq!(axis.coord_to_idx(1.0), Some(0));
        assert_eq!(axis.coord_to_idx(2.0), Some(1));
        assert_eq!(axis.coord_to_idx(3.9), Some(1));
        assert_eq!(axis.coord_to_idx(4.0), None);
        assert_eq!(axis.coord_to_idx(0.5), None);
        assert_eq!(axis.coord_to_idx(f64::NAN), None);
    }

    #[test]
    fn rejects_unsorted_edges() {
        assert!(MapAxis::from_edges(vec![1.0, 1.0], "energy", "TeV").is_err());
        assert!(MapAxis::from_edges(vec![1.0], "energy", "TeV").is_err());
    }

    #[test]
    fn squash_keeps_outer_edges() {
        let axis = MapAxis::energy_from_bounds(0.5, 50.0, 4).unwrap();
        let squashed = axis.squash();
        assert_eq!(squashed.nbin(), 1);
        assert_abs_diff_eq!(squashed.edge_min(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(squashed.edge_max(), 50.0, epsilon = 1e-9);
    }
}
