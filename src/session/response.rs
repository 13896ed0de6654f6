//! session/response.rs — from raw key presses to a tagged response.
//!
//! Which physical key means "yes" differs per chamber button box, and which
//! answer counts as a detection is a polarity choice that used to be
//! hardcoded inconsistently across the longhand scripts. Both live here as
//! data, decided once at the collaborator boundary.

use serde::{Deserialize, Serialize};

use crate::session::Chamber;

/// What the participant reported about the stimulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Detected,
    NotDetected,
}

impl Response {
    #[inline]
    pub fn detected(self) -> bool {
        matches!(self, Response::Detected)
    }
}

/// Outcome of classifying one raw input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classified {
    Answer(Response),
    /// Timed out without a key press.
    NoResponse,
    /// A key outside the configured pair.
    Unknown,
}

/// Mapping from raw keys to responses for one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMap {
    pub yes_key: String,
    pub no_key: String,
    /// Whether the "yes" key reports a detection. Polarity is configuration,
    /// never a hardcoded convention.
    pub yes_means_detected: bool,
}

impl KeyMap {
    pub fn new(yes_key: &str, no_key: &str, yes_means_detected: bool) -> Self {
        Self {
            yes_key: yes_key.to_string(),
            no_key: no_key.to_string(),
            yes_means_detected,
        }
    }

    /// Button-box layout of the given chamber. Pairs with an odd id get the
    /// two keys swapped, counterbalancing finger assignment across pairs.
    pub fn for_chamber(chamber: Chamber, pair_id: u32) -> Self {
        let (yes, no) = match chamber {
            Chamber::One => ("2", "1"),
            Chamber::Two => ("7", "8"),
        };
        if pair_id % 2 == 0 {
            Self::new(yes, no, true)
        } else {
            Self::new(no, yes, true)
        }
    }

    /// Classify one raw input event. Total and pure.
    pub fn classify(&self, raw: Option<&str>) -> Classified {
        match raw {
            None => Classified::NoResponse,
            Some(key) if key == self.yes_key => Classified::Answer(self.answer(true)),
            Some(key) if key == self.no_key => Classified::Answer(self.answer(false)),
            Some(_) => Classified::Unknown,
        }
    }

    fn answer(&self, yes: bool) -> Response {
        if yes == self.yes_means_detected {
            Response::Detected
        } else {
            Response::NotDetected
        }
    }
}
