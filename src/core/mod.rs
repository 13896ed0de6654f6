//! Estimator core: grid, psychometric model, posterior, staircase.

pub mod grid;
pub mod posterior;
pub mod quest;
pub mod weibull;
