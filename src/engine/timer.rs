//! Deferred phase transitions.
//!
//! A timer is a spawned task that sleeps and then re-enters the engine by
//! room code. Its abort handle is stored in the round's [`RoundTimers`], so
//! entering any phase cancels it. A timer that still gets through re-checks
//! the room's round sequence and phase and quietly does nothing if either
//! moved on.
//!
//! [`RoundTimers`]: crate::session::RoundTimers

use std::time::Duration;

use tracing::{debug, warn};

use super::GameEngine;
use crate::error::Result;
use crate::protocol::RoundEndReason;
use crate::session::{Phase, Session};

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Word-selection window elapsed: auto-pick the first option.
    WordSelect,
    /// Reveal one more letter of the mask.
    RevealHint,
    /// Round duration elapsed.
    RoundEnd,
    /// Inter-round pause elapsed.
    NextRound,
}

impl TimerKind {
    /// The phase the room must still be in for the timer to act.
    pub fn expected_phase(&self) -> Phase {
        match self {
            Self::WordSelect => Phase::SelectingWord,
            Self::RevealHint | Self::RoundEnd => Phase::Drawing,
            Self::NextRound => Phase::RoundEnd,
        }
    }
}

impl GameEngine {
    /// Schedule `kind` to fire after `delay` for the session's current round.
    pub(super) fn arm(&self, session: &mut Session, delay: Duration, kind: TimerKind) {
        let engine = self.clone();
        let room_code = session.room_code.clone();
        let seq = session.round_seq;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.fire(&room_code, seq, kind).await;
        });
        session.round.timers.push(task.abort_handle());
    }

    async fn fire(&self, room_code: &str, seq: u64, kind: TimerKind) {
        let Some(handle) = self.inner.registry.get(room_code) else {
            debug!(room = %room_code, timer = ?kind, "timer fired for missing room");
            return;
        };
        let mut session = handle.lock().await;
        if session.closed || session.round_seq != seq || session.phase != kind.expected_phase() {
            debug!(room = %room_code, timer = ?kind, phase = %session.phase, "stale timer ignored");
            return;
        }

        // System-triggered transitions are best effort: nobody to report to.
        if let Err(err) = self.run_timer(&mut session, kind) {
            warn!(room = %room_code, timer = ?kind, error = %err, "timer transition failed");
        }
    }

    fn run_timer(&self, session: &mut Session, kind: TimerKind) -> Result<()> {
        match kind {
            TimerKind::WordSelect => {
                if session.round.word.is_some() {
                    return Ok(());
                }
                let Some(word) = session.round.word_options.first().cloned() else {
                    warn!(room = %session.room_code, "no word to auto-pick, skipping turn");
                    return self.advance_locked(session);
                };
                debug!(room = %session.room_code, "word selection timed out, auto-picking");
                self.apply_word(session, word);
                Ok(())
            }
            TimerKind::RevealHint => {
                self.reveal_hint(session);
                Ok(())
            }
            TimerKind::RoundEnd => self.end_round_locked(session, RoundEndReason::Time),
            TimerKind::NextRound => self.advance_locked(session),
        }
    }
}
