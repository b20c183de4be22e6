//! Candidate words offered to the drawer.
//!
//! The engine only needs [`WordSupply::pick`]. The built-in [`TieredWordSupply`]
//! mixes words from three difficulty tiers, unless the host supplied at least
//! three custom words, in which case a uniform shuffle of those is offered.

use rand::prelude::*;

use crate::session::Settings;

/// Custom lists shorter than this fall back to the default pool.
pub const MIN_CUSTOM_WORDS: usize = 3;

/// Upper bound on options drawn from a custom list.
pub const MAX_CUSTOM_OPTIONS: usize = 5;

const EASY_WORDS: &[&str] = &[
    "apple", "ball", "cat", "dog", "fish", "house", "moon", "pizza", "star", "sun", "tree",
    "car", "hat", "cake", "boat", "book", "chair", "cloud", "egg", "key",
];

const MEDIUM_WORDS: &[&str] = &[
    "airport", "bicycle", "camera", "doctor", "guitar", "library", "mountain", "rainbow",
    "rocket", "sandwich", "umbrella", "football", "diamond", "castle", "pirate", "dragon",
];

const HARD_WORDS: &[&str] = &[
    "butterfly", "computer", "elephant", "painting", "volcano", "whisper", "lighthouse",
    "astronaut", "hurricane", "telescope", "skyscraper", "waterfall", "submarine",
    "fireworks", "traffic jam", "time machine",
];

/// Source of candidate words for a round.
pub trait WordSupply: Send + Sync + 'static {
    /// Returns an ordered list of lowercase candidates for the room's next turn.
    fn pick(&self, settings: &Settings) -> Vec<String>;
}

/// How many words to take from each tier of the default pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierMix {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl Default for TierMix {
    fn default() -> Self {
        Self {
            easy: 2,
            medium: 1,
            hard: 2,
        }
    }
}

/// Default [`WordSupply`] backed by the built-in difficulty tiers.
#[derive(Debug, Clone, Default)]
pub struct TieredWordSupply {
    mix: TierMix,
}

impl TieredWordSupply {
    pub fn new(mix: TierMix) -> Self {
        Self { mix }
    }

    /// Pick candidates using a specific RNG (for testing/seeding).
    pub fn pick_with_rng<R: Rng + ?Sized>(&self, settings: &Settings, rng: &mut R) -> Vec<String> {
        if settings.custom_words.len() >= MIN_CUSTOM_WORDS {
            let mut pool: Vec<String> = settings
                .custom_words
                .iter()
                .map(|w| w.to_lowercase())
                .collect();
            pool.shuffle(rng);
            pool.truncate(MAX_CUSTOM_OPTIONS);
            return pool;
        }

        let mut out = Vec::with_capacity(self.mix.easy + self.mix.medium + self.mix.hard);
        for (tier, count) in [
            (EASY_WORDS, self.mix.easy),
            (MEDIUM_WORDS, self.mix.medium),
            (HARD_WORDS, self.mix.hard),
        ] {
            out.extend(tier.choose_multiple(rng, count).map(|w| w.to_string()));
        }
        out
    }
}

impl WordSupply for TieredWordSupply {
    fn pick(&self, settings: &Settings) -> Vec<String> {
        self.pick_with_rng(settings, &mut rand::rng())
    }
}

/// A [`WordSupply`] that always offers the same list. Handy for tests and
/// scripted demos.
#[derive(Debug, Clone)]
pub struct FixedWordSupply {
    words: Vec<String>,
}

impl FixedWordSupply {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
        }
    }
}

impl WordSupply for FixedWordSupply {
    fn pick(&self, _settings: &Settings) -> Vec<String> {
        self.words.clone()
    }
}
