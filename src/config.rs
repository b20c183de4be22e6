//! Engine and gateway tunables.
//!
//! Both configs come with the production defaults and builder-style setters:
//!
//! ```
//! use sketch_session::config::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig::default()
//!     .with_word_select_window(Duration::from_secs(15))
//!     .with_chat_cooldown(Duration::from_millis(500));
//! assert_eq!(config.word_select_window, Duration::from_secs(15));
//! ```

use std::time::Duration;

use crate::session::Settings;

/// Default length of the word-selection window.
const DEFAULT_WORD_SELECT_WINDOW: Duration = Duration::from_secs(10);

/// Default pause between `round_end` and the next word selection.
const DEFAULT_ROUND_END_PAUSE: Duration = Duration::from_secs(5);

const DEFAULT_MAX_STROKES_PER_ROUND: usize = 1200;
const DEFAULT_MAX_POINTS_PER_STROKE: usize = 300;
const DEFAULT_CHAT_COOLDOWN: Duration = Duration::from_millis(350);
const DEFAULT_ROOM_CODE_LENGTH: usize = 6;
const DEFAULT_DRAWER_BONUS: u32 = 25;

/// Default capacity of each connection's outbound channel.
const DEFAULT_OUTBOUND_CHANNEL_CAPACITY: usize = 256;

/// Configuration for a [`GameEngine`](crate::engine::GameEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long the drawer has to pick a word before the first option is
    /// auto-selected.
    pub word_select_window: Duration,
    /// Pause between the end of a round and the next drawer's turn.
    pub round_end_pause: Duration,
    /// Retained strokes per round; the oldest are evicted past this cap.
    pub max_strokes_per_round: usize,
    /// Points kept per stroke; extra points are truncated.
    pub max_points_per_stroke: usize,
    /// Minimum interval between two chat lines from the same player.
    pub chat_cooldown: Duration,
    /// Length of generated room codes.
    pub room_code_length: usize,
    /// Flat bonus the drawer earns per correct guess.
    pub drawer_bonus: u32,
    /// Settings every new room starts with.
    pub default_settings: Settings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            word_select_window: DEFAULT_WORD_SELECT_WINDOW,
            round_end_pause: DEFAULT_ROUND_END_PAUSE,
            max_strokes_per_round: DEFAULT_MAX_STROKES_PER_ROUND,
            max_points_per_stroke: DEFAULT_MAX_POINTS_PER_STROKE,
            chat_cooldown: DEFAULT_CHAT_COOLDOWN,
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
            drawer_bonus: DEFAULT_DRAWER_BONUS,
            default_settings: Settings::default(),
        }
    }
}

impl EngineConfig {
    /// Set the word-selection window.
    #[must_use]
    pub fn with_word_select_window(mut self, window: Duration) -> Self {
        self.word_select_window = window;
        self
    }

    /// Set the pause between rounds.
    #[must_use]
    pub fn with_round_end_pause(mut self, pause: Duration) -> Self {
        self.round_end_pause = pause;
        self
    }

    /// Set the per-round stroke cap. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_strokes_per_round(mut self, cap: usize) -> Self {
        self.max_strokes_per_round = cap.max(1);
        self
    }

    /// Set the per-stroke point cap. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_max_points_per_stroke(mut self, cap: usize) -> Self {
        self.max_points_per_stroke = cap.max(1);
        self
    }

    /// Set the chat cooldown. A zero cooldown disables rate limiting.
    #[must_use]
    pub fn with_chat_cooldown(mut self, cooldown: Duration) -> Self {
        self.chat_cooldown = cooldown;
        self
    }

    /// Set the room code length. Values below 4 are clamped to 4.
    #[must_use]
    pub fn with_room_code_length(mut self, length: usize) -> Self {
        self.room_code_length = length.max(4);
        self
    }

    /// Set the settings new rooms start with. Out-of-domain fields are
    /// replaced exactly as they would be in a host's settings patch.
    #[must_use]
    pub fn with_default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = settings.validated();
        self
    }
}

/// Configuration for a [`Gateway`](crate::gateway::Gateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Capacity of each connection's bounded outbound channel.
    ///
    /// When a connection cannot keep up, events addressed to it are dropped
    /// (with a warning logged) so that the engine never blocks on a slow client.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub outbound_channel_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            outbound_channel_capacity: DEFAULT_OUTBOUND_CHANNEL_CAPACITY,
        }
    }
}

impl GatewayConfig {
    /// Set the outbound channel capacity. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_outbound_channel_capacity(mut self, capacity: usize) -> Self {
        self.outbound_channel_capacity = capacity.max(1);
        self
    }
}
