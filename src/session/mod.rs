//! Experiment-control layer around the estimator: response mapping, role
//! schedules, trial plans, simulated observers, the titration loop, and the
//! persisted session record.

pub mod observer;
pub mod report;
pub mod response;
pub mod roles;
pub mod runner;
pub mod trial_plan;

/// Which soundproof chamber a participant sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chamber {
    One,
    Two,
}

impl Chamber {
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Chamber::One),
            2 => Some(Chamber::Two),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Chamber::One => 1,
            Chamber::Two => 2,
        }
    }
}

impl std::fmt::Display for Chamber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
