//! session/trial_plan.rs — balanced stimulus conditions and break policy.

use rand::Rng;
use rand::seq::SliceRandom;

/// Stimulus condition of one trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Signal,
    Noise,
}

/// Shuffled condition order for one block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrialPlan {
    conditions: Vec<Condition>,
}

impl TrialPlan {
    /// Half the trials carry signal; an odd count gets the extra noise
    /// trial. Order is shuffled with the session rng.
    pub fn balanced(trials: usize, rng: &mut impl Rng) -> Self {
        let signal = trials / 2;
        let mut conditions: Vec<Condition> = (0..trials)
            .map(|i| {
                if i < signal {
                    Condition::Signal
                } else {
                    Condition::Noise
                }
            })
            .collect();
        conditions.shuffle(rng);
        Self { conditions }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn condition_at(&self, trial: usize) -> Option<Condition> {
        self.conditions.get(trial).copied()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn count(&self, condition: Condition) -> usize {
        self.conditions.iter().filter(|&&c| c == condition).count()
    }
}

/// Who ends the pause after a finished block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakKind {
    /// The subjects continue when ready.
    Subject,
    /// The experimenter must come in and release the session.
    Experimenter,
}

/// Break policy after `block` (1-based): every second block ends in a
/// mandatory experimenter-released break.
pub fn break_after(block: usize) -> BreakKind {
    if block % 2 == 0 {
        BreakKind::Experimenter
    } else {
        BreakKind::Subject
    }
}
