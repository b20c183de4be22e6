//! Pure game rules: the reveal mask, guess matching and the scoring formula.

use std::collections::BTreeSet;
use std::time::Duration;

use rand::prelude::*;

/// Points never drop below this floor for a correct guess.
pub const MIN_GUESS_POINTS: u32 = 20;

const BASE_POINTS: i64 = 100;
const TIME_BONUS_POINTS: f64 = 150.0;
const ORDER_PENALTY: i64 = 10;

/// Build the mask shown to guessers: one token per character of `word`,
/// tokens joined by single spaces. Revealed positions show the uppercased
/// character, everything else is `_`.
pub fn build_mask(word: &str, revealed: &BTreeSet<usize>) -> String {
    word.chars()
        .enumerate()
        .map(|(idx, ch)| {
            if revealed.contains(&idx) {
                ch.to_uppercase().collect::<String>()
            } else {
                "_".to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reveal one more letter of `word`, returning the newly revealed index.
///
/// Whitespace is never revealed. Returns `None` once every letter is shown.
pub fn reveal_random_letter(word: &str, revealed: &mut BTreeSet<usize>) -> Option<usize> {
    reveal_random_letter_with_rng(word, revealed, &mut rand::rng())
}

/// Same as [`reveal_random_letter`] with a caller-supplied RNG.
pub fn reveal_random_letter_with_rng<R: Rng + ?Sized>(
    word: &str,
    revealed: &mut BTreeSet<usize>,
    rng: &mut R,
) -> Option<usize> {
    let hidden: Vec<usize> = word
        .chars()
        .enumerate()
        .filter(|(idx, ch)| !ch.is_whitespace() && !revealed.contains(idx))
        .map(|(idx, _)| idx)
        .collect();
    let pick = *hidden.choose(rng)?;
    revealed.insert(pick);
    Some(pick)
}

/// Normalize chat text for comparison against the secret word.
///
/// Lowercases, drops punctuation and symbols, trims and collapses runs of
/// whitespace into a single space.
pub fn normalize_guess(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns `true` if `guess` matches `word` under [`normalize_guess`].
pub fn is_correct_guess(guess: &str, word: &str) -> bool {
    let normalized = normalize_guess(guess);
    !normalized.is_empty() && normalized == normalize_guess(word)
}

/// Fraction of the round still remaining, clamped to `[0, 1]`.
pub fn time_left_ratio(time_left: Duration, round_duration: Duration) -> f64 {
    if round_duration.is_zero() {
        return 0.0;
    }
    (time_left.as_secs_f64() / round_duration.as_secs_f64()).clamp(0.0, 1.0)
}

/// Points for a correct guess.
///
/// `max(20, 100 + floor(ratio * 150) - 10 * order_index)` where `order_index`
/// is the zero-based rank among this round's correct guessers.
pub fn guess_points(time_left_ratio: f64, order_index: usize) -> u32 {
    let ratio = if time_left_ratio.is_finite() {
        time_left_ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let time_bonus = (ratio * TIME_BONUS_POINTS).floor() as i64;
    let penalty = ORDER_PENALTY.saturating_mul(i64::try_from(order_index).unwrap_or(i64::MAX));
    let points = BASE_POINTS
        .saturating_add(time_bonus)
        .saturating_sub(penalty);
    u32::try_from(points.max(i64::from(MIN_GUESS_POINTS))).unwrap_or(MIN_GUESS_POINTS)
}
