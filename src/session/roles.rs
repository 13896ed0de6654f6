//! session/roles.rs — acting/observing assignment across trials.
//!
//! One subject acts on a trial while the other observes. The whole schedule
//! is drawn up front, so the role on any trial is a deterministic lookup
//! rather than state advanced by iteration.

use rand::Rng;

/// A subject's role on one trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Acting,
    Observing,
}

impl Role {
    /// The partner's role on the same trial.
    #[inline]
    pub fn other(self) -> Role {
        match self {
            Role::Acting => Role::Observing,
            Role::Observing => Role::Acting,
        }
    }
}

/// Pre-drawn role assignment for subject one; subject two gets the
/// complement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleSchedule {
    slots: Vec<Role>,
}

impl RoleSchedule {
    /// Draw a uniform random schedule for `n_trials` trials.
    pub fn draw(n_trials: usize, rng: &mut impl Rng) -> Self {
        let slots = (0..n_trials)
            .map(|_| {
                if rng.random_range(0..2) == 0 {
                    Role::Acting
                } else {
                    Role::Observing
                }
            })
            .collect();
        Self { slots }
    }

    /// Schedule with explicit slots, for replays and tests.
    pub fn from_slots(slots: Vec<Role>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Subject one's role on `trial`; None when the index is off the end.
    pub fn role_at(&self, trial: usize) -> Option<Role> {
        self.slots.get(trial).copied()
    }

    /// Subject two's role on `trial`.
    pub fn partner_at(&self, trial: usize) -> Option<Role> {
        self.role_at(trial).map(Role::other)
    }
}
