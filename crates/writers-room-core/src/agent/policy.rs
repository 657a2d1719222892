//! Turn-taking policy.
//!
//! Evaluated after every foreign line an agent observes. The trigger is the
//! newest history entry. Rules in order:
//! 1. The trigger mentions the agent by name.
//! 2. The speaker before the trigger was someone else (or nobody) and the
//!    agent authored fewer than 2 of the last 3 entries.
//! 3. A random interjection with probability `p`.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::history::ConversationHistory;

const RECENCY_WINDOW: usize = 3;
const RECENCY_LIMIT: usize = 2;

/// Why an agent chose to speak, or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDecision {
    Mentioned,
    Recency,
    Interjection,
    Silent,
}

impl TurnDecision {
    pub fn speaks(self) -> bool {
        !matches!(self, TurnDecision::Silent)
    }
}

/// Speak rule with an injectable random source.
pub struct TurnPolicy {
    probability: f64,
    rng: Box<dyn RngCore + Send + Sync>,
}

impl TurnPolicy {
    /// Policy drawing from OS entropy.
    pub fn new(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_entropy())
    }

    /// Deterministic policy for reproducible runs.
    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::with_rng(probability, StdRng::seed_from_u64(seed))
    }

    /// Out-of-range probabilities are clamped; NaN and infinities mean never.
    pub fn with_rng(probability: f64, rng: impl RngCore + Send + Sync + 'static) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            probability,
            rng: Box::new(rng),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn evaluate(&mut self, me: &str, history: &ConversationHistory) -> TurnDecision {
        let Some(trigger) = history.last() else {
            return TurnDecision::Silent;
        };
        if trigger.from == me {
            return TurnDecision::Silent;
        }

        if trigger.mentions(me) {
            return TurnDecision::Mentioned;
        }

        let last_speaker_is_other = history.previous().is_none_or(|e| e.from != me);
        if last_speaker_is_other && history.authored_in_last(me, RECENCY_WINDOW) < RECENCY_LIMIT {
            return TurnDecision::Recency;
        }

        if self.rng.gen_bool(self.probability) {
            TurnDecision::Interjection
        } else {
            TurnDecision::Silent
        }
    }
}

impl std::fmt::Debug for TurnPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnPolicy")
            .field("probability", &self.probability)
            .finish_non_exhaustive()
    }
}
