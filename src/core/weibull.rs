//! core/weibull.rs — Weibull psychometric function in dB-like units.
//!
//! Detection probability for a stimulus `u` dB-units above a reference point:
//!
//! `F(u) = delta*gamma + (1-delta) * (1 - (1-gamma) * exp(-10^(beta*u/20)))`
//!
//! `gamma` is the guess rate (floor as u → -inf), `delta` the lapse rate
//! (ceiling `1 - delta*(1-gamma)` as u → +inf), `beta` the slope.

/// Conventional slope for detection tasks (Watson & Pelli).
pub const DEFAULT_BETA: f64 = 3.5;
/// Conventional lapse rate.
pub const DEFAULT_DELTA: f64 = 0.01;

/// Shape parameters of the Weibull detection curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeibullPsychometric {
    pub beta: f64,
    pub delta: f64,
    pub gamma: f64,
}

impl WeibullPsychometric {
    pub fn new(beta: f64, delta: f64, gamma: f64) -> Self {
        assert!(beta.is_finite() && beta > 0.0);
        assert!(delta.is_finite() && (0.0..1.0).contains(&delta));
        assert!(gamma.is_finite() && (0.0..1.0).contains(&gamma));
        Self { beta, delta, gamma }
    }

    /// Detection probability at offset `u` (dB-like units) from the curve's
    /// unit-exponent point.
    #[inline]
    pub fn probability_at_offset(&self, u: f64) -> f64 {
        let k = 10f64.powf(self.beta * u / 20.0);
        self.delta * self.gamma + (1.0 - self.delta) * (1.0 - (1.0 - self.gamma) * (-k).exp())
    }

    /// Lower asymptote: chance performance.
    #[inline]
    pub fn floor(&self) -> f64 {
        self.gamma
    }

    /// Upper asymptote: perfect performance minus lapses.
    #[inline]
    pub fn ceiling(&self) -> f64 {
        1.0 - self.delta * (1.0 - self.gamma)
    }

    /// Offset `u_p` such that `probability_at_offset(u_p) == p`.
    ///
    /// Anchors the threshold parameter: with the likelihood evaluated at
    /// `x - t + u_p`, a stimulus exactly at threshold is detected with
    /// probability `p`. Returns None unless `floor() < p < ceiling()`.
    pub fn threshold_offset(&self, p: f64) -> Option<f64> {
        if !p.is_finite() || p <= self.floor() || p >= self.ceiling() {
            return None;
        }
        let a = (p - self.delta * self.gamma) / (1.0 - self.delta);
        let k = ((1.0 - self.gamma) / (1.0 - a)).ln();
        let u = (20.0 / self.beta) * k.log10();
        if u.is_finite() { Some(u) } else { None }
    }

    /// Probability of detecting intensity `x` given threshold `t`, with the
    /// anchor offset from `threshold_offset`.
    #[inline]
    pub fn detection_probability(&self, x: f64, threshold: f64, anchor: f64) -> f64 {
        self.probability_at_offset(x - threshold + anchor)
    }
}
