#![no_main]

use std::collections::BTreeSet;

use libfuzzer_sys::fuzz_target;
use sketch_session::rules;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let (guess, word) = s.split_once('\n').unwrap_or((s, s));

    let normalized = rules::normalize_guess(guess);
    assert_eq!(rules::normalize_guess(&normalized), normalized);
    if !normalized.is_empty() {
        assert!(rules::is_correct_guess(guess, guess));
    }
    let _ = rules::is_correct_guess(guess, word);

    let mut revealed = BTreeSet::new();
    while rules::reveal_random_letter(word, &mut revealed).is_some() {}
    let mask = rules::build_mask(word, &revealed);
    if !word.is_empty() {
        assert_eq!(mask.split(' ').count(), word.chars().count());
    }
});
