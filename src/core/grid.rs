//! core/grid.rs — uniform intensity axis for the threshold posterior.
//!
//! The staircase works on a discretized parameter space: candidate stimulus
//! intensities and candidate thresholds share one grid over
//! `[min_val, max_val]` with constant step `grain`.

/// Number of grid points used when the caller does not pick a grain.
pub const DEFAULT_GRID_POINTS: usize = 500;

/// Uniform, inclusive intensity grid.
#[derive(Clone, Debug)]
pub struct IntensityGrid {
    pub min_val: f64,
    pub max_val: f64,
    pub grain: f64,
    pub values: Vec<f64>,
}

impl IntensityGrid {
    /// Create a grid spanning min_val..max_val (inclusive) with step `grain`.
    pub fn new(min_val: f64, max_val: f64, grain: f64) -> Self {
        assert!(min_val.is_finite() && max_val.is_finite() && max_val > min_val);
        assert!(grain.is_finite() && grain > 0.0);

        let n = ((max_val - min_val) / grain).floor() as usize + 1;
        let values: Vec<f64> = (0..n).map(|i| min_val + i as f64 * grain).collect();

        Self {
            min_val,
            max_val,
            grain,
            values,
        }
    }

    /// Grid with the default resolution: `(max_val - min_val) / 500`.
    pub fn with_default_grain(min_val: f64, max_val: f64) -> Self {
        assert!(min_val.is_finite() && max_val.is_finite() && max_val > min_val);
        let grain = (max_val - min_val) / DEFAULT_GRID_POINTS as f64;
        Self::new(min_val, max_val, grain)
    }

    /// Number of grid points.
    #[inline]
    pub fn n_points(&self) -> usize {
        self.values.len()
    }

    /// Step between adjacent grid points.
    #[inline]
    pub fn step(&self) -> f64 {
        self.grain
    }

    /// Width of the covered interval.
    #[inline]
    pub fn span(&self) -> f64 {
        self.max_val - self.min_val
    }

    /// Intensity value at grid index i.
    #[inline]
    pub fn value_of_index(&self, i: usize) -> f64 {
        self.values[i]
    }

    /// Find the nearest grid index for an intensity.
    pub fn index_of_value(&self, x: f64) -> Option<usize> {
        self.pos_of_value(x).map(|pos| {
            let idx = pos.round() as usize;
            idx.min(self.values.len() - 1)
        })
    }

    /// Map an intensity to a continuous grid position (0..n_points-1).
    pub fn pos_of_value(&self, x: f64) -> Option<f64> {
        if !x.is_finite() || x < self.min_val || x > self.max_val {
            return None;
        }
        let pos = (x - self.min_val) / self.grain;
        if pos.is_finite() { Some(pos) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_basic() {
        let g = IntensityGrid::new(0.0, 1.0, 0.01);
        assert_eq!(g.n_points(), 101);
        assert!((g.value_of_index(0) - 0.0).abs() < 1e-12);
        assert!((g.value_of_index(100) - 1.0).abs() < 1e-12);
        assert!((g.step() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_grid_uniform_spacing() {
        let g = IntensityGrid::new(-0.5, 0.5, 0.004);
        let steps: Vec<f64> = g.values.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.iter().all(|&s| (s - 0.004).abs() < 1e-12));
        assert!(g.values.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_default_grain_resolution() {
        let g = IntensityGrid::with_default_grain(0.0, 1.0);
        assert_eq!(g.n_points(), DEFAULT_GRID_POINTS + 1);
        assert!((g.step() - 1.0 / DEFAULT_GRID_POINTS as f64).abs() < 1e-12);
    }

    #[test]
    fn test_index_of_value_round_trip() {
        let g = IntensityGrid::new(0.0, 1.0, 0.002);
        for i in [0, 1, 250, g.n_points() - 1] {
            let x = g.value_of_index(i);
            assert_eq!(g.index_of_value(x), Some(i), "round trip failed at {i}");
        }
    }

    #[test]
    fn test_index_of_value_nearest() {
        let g = IntensityGrid::new(0.0, 1.0, 0.1);
        assert_eq!(g.index_of_value(0.26), Some(3));
        assert_eq!(g.index_of_value(0.24), Some(2));
    }

    #[test]
    fn test_out_of_range_is_none() {
        let g = IntensityGrid::new(0.0, 1.0, 0.1);
        assert_eq!(g.index_of_value(-0.01), None);
        assert_eq!(g.index_of_value(1.01), None);
        assert_eq!(g.pos_of_value(f64::NAN), None);
        assert_eq!(g.pos_of_value(f64::INFINITY), None);
    }
}
