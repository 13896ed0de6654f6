// Library surface: estimator core plus the session layer around it.
pub mod cli;
pub mod config;
pub mod core;
pub mod session;
