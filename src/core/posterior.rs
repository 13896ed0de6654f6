//! core/posterior.rs — discretized posterior over the threshold grid.
//!
//! The belief about a participant's threshold is a probability mass function
//! over `IntensityGrid` points, kept normalized after every update.

use crate::core::grid::IntensityGrid;

/// Mass below this is treated as zero when renormalizing.
pub const EPS_MASS: f64 = 1e-300;

/// Shannon entropy (nats) of a normalized mass vector.
pub fn entropy_nats(pmf: &[f64]) -> f64 {
    pmf.iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -p * p.ln())
        .sum()
}

/// Normalized belief over threshold candidates.
#[derive(Clone, Debug)]
pub struct Posterior {
    grid: IntensityGrid,
    pmf: Vec<f64>,
}

impl Posterior {
    /// Gaussian prior centered on `center` with standard deviation `sd`,
    /// discretized onto the grid and normalized.
    ///
    /// A prior too narrow for the grid collapses to a point mass on the grid
    /// value nearest `center`.
    pub fn gaussian(grid: IntensityGrid, center: f64, sd: f64) -> Self {
        assert!(center.is_finite());
        assert!(sd.is_finite() && sd > 0.0);

        let mut pmf: Vec<f64> = grid
            .values
            .iter()
            .map(|&x| {
                let z = (x - center) / sd;
                (-0.5 * z * z).exp()
            })
            .collect();
        let total: f64 = pmf.iter().sum();
        if total > EPS_MASS {
            for p in &mut pmf {
                *p /= total;
            }
        } else {
            let pos = (center - grid.min_val) / grid.step();
            let idx = (pos.round().max(0.0) as usize).min(grid.n_points() - 1);
            pmf.fill(0.0);
            pmf[idx] = 1.0;
        }

        Self { grid, pmf }
    }

    #[inline]
    pub fn grid(&self) -> &IntensityGrid {
        &self.grid
    }

    #[inline]
    pub fn pmf(&self) -> &[f64] {
        &self.pmf
    }

    /// Multiply each point's mass by `likelihood(index)` and renormalize.
    ///
    /// When the reweighted mass is vanishing or non-finite the posterior is
    /// left untouched and false is returned.
    pub fn apply_likelihood<F>(&mut self, likelihood: F) -> bool
    where
        F: Fn(usize) -> f64,
    {
        let next: Vec<f64> = self
            .pmf
            .iter()
            .enumerate()
            .map(|(i, &p)| p * likelihood(i))
            .collect();
        let total: f64 = next.iter().sum();
        if !total.is_finite() || total <= EPS_MASS {
            return false;
        }
        self.pmf = next;
        for p in &mut self.pmf {
            *p /= total;
        }
        true
    }

    /// Posterior mean threshold.
    pub fn mean(&self) -> f64 {
        self.pmf
            .iter()
            .zip(self.grid.values.iter())
            .map(|(&p, &x)| p * x)
            .sum()
    }

    /// Posterior standard deviation.
    pub fn sd(&self) -> f64 {
        let mean = self.mean();
        let var: f64 = self
            .pmf
            .iter()
            .zip(self.grid.values.iter())
            .map(|(&p, &x)| p * (x - mean) * (x - mean))
            .sum();
        var.max(0.0).sqrt()
    }

    /// Grid value with the largest mass; ties resolve to the smallest value.
    pub fn mode(&self) -> f64 {
        let mut best = 0;
        for (i, &p) in self.pmf.iter().enumerate() {
            if p > self.pmf[best] {
                best = i;
            }
        }
        self.grid.values[best]
    }

    /// Smallest grid value where cumulative mass reaches `q`, with linear
    /// interpolation between adjacent points. `q` is clamped to [0, 1].
    pub fn quantile(&self, q: f64) -> f64 {
        let q = q.clamp(0.0, 1.0);
        let values = &self.grid.values;
        let mut cum = 0.0;
        for (i, &p) in self.pmf.iter().enumerate() {
            let prev = cum;
            cum += p;
            if cum >= q {
                if i == 0 || cum - prev <= 0.0 {
                    return values[i];
                }
                let frac = (q - prev) / (cum - prev);
                return values[i - 1] + frac * (values[i] - values[i - 1]);
            }
        }
        values[values.len() - 1]
    }

    /// Entropy (nats) of the current belief.
    pub fn entropy(&self) -> f64 {
        entropy_nats(&self.pmf)
    }
}
