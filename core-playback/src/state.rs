//! # Player Lifecycle States
//!
//! The controller's state machine and the static legality table gating every
//! operation. The table is data, not control flow, so it can be enumerated
//! and verified exhaustively in tests.

use serde::{Deserialize, Serialize};

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// No source bound; the initial state and the result of `reset`.
    Idle,
    /// A source is bound but not yet prepared.
    Initialized,
    /// An asynchronous prepare is in flight.
    Preparing,
    /// The source is ready to start.
    Prepared,
    /// Audio is playing.
    Started,
    /// Playback is paused at the current position.
    Paused,
    /// Playback was stopped; the source must be prepared again.
    Stopped,
    /// The stream played to its end.
    PlaybackComplete,
    /// The engine faulted; only `reset` leaves this state.
    Error,
}

/// Every state, for table-driven tests and diagnostics.
pub const ALL_STATES: [PlayerState; 9] = [
    PlayerState::Idle,
    PlayerState::Initialized,
    PlayerState::Preparing,
    PlayerState::Prepared,
    PlayerState::Started,
    PlayerState::Paused,
    PlayerState::Stopped,
    PlayerState::PlaybackComplete,
    PlayerState::Error,
];

/// Controller operations subject to lifecycle gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    SetSource,
    Prepare,
    PrepareAsync,
    Start,
    Pause,
    Stop,
    SeekTo,
    SetLooping,
    SetVolume,
    SetRate,
    Reset,
}

/// Every gated operation, for table-driven tests.
pub const ALL_OPERATIONS: [Operation; 11] = [
    Operation::SetSource,
    Operation::Prepare,
    Operation::PrepareAsync,
    Operation::Start,
    Operation::Pause,
    Operation::Stop,
    Operation::SeekTo,
    Operation::SetLooping,
    Operation::SetVolume,
    Operation::SetRate,
    Operation::Reset,
];

// Parameter setters share one legality set.
const PARAMETER_STATES: &[PlayerState] = &[
    PlayerState::Idle,
    PlayerState::Initialized,
    PlayerState::Stopped,
    PlayerState::Prepared,
    PlayerState::Started,
    PlayerState::Paused,
    PlayerState::PlaybackComplete,
];

impl Operation {
    /// States from which this operation may be invoked.
    pub fn legal_sources(self) -> &'static [PlayerState] {
        match self {
            Operation::SetSource => &[PlayerState::Idle],
            Operation::Prepare | Operation::PrepareAsync => {
                &[PlayerState::Initialized, PlayerState::Stopped]
            }
            Operation::Start => &[
                PlayerState::Prepared,
                PlayerState::Started,
                PlayerState::Paused,
                PlayerState::PlaybackComplete,
            ],
            Operation::Pause => &[PlayerState::Started, PlayerState::Paused],
            Operation::Stop => &[
                PlayerState::Prepared,
                PlayerState::Started,
                PlayerState::Stopped,
                PlayerState::Paused,
                PlayerState::PlaybackComplete,
            ],
            Operation::SeekTo => &[
                PlayerState::Prepared,
                PlayerState::Started,
                PlayerState::Paused,
                PlayerState::PlaybackComplete,
            ],
            Operation::SetLooping | Operation::SetVolume | Operation::SetRate => PARAMETER_STATES,
            Operation::Reset => &ALL_STATES,
        }
    }

    /// Whether the operation is legal from `state`.
    pub fn allowed_from(self, state: PlayerState) -> bool {
        self.legal_sources().contains(&state)
    }

    /// Stable lower-case name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Operation::SetSource => "set_source",
            Operation::Prepare => "prepare",
            Operation::PrepareAsync => "prepare_async",
            Operation::Start => "start",
            Operation::Pause => "pause",
            Operation::Stop => "stop",
            Operation::SeekTo => "seek_to",
            Operation::SetLooping => "set_looping",
            Operation::SetVolume => "set_volume",
            Operation::SetRate => "set_rate",
            Operation::Reset => "reset",
        }
    }
}

/// States in which the stream duration is a meaningful query.
pub fn duration_queryable(state: PlayerState) -> bool {
    matches!(
        state,
        PlayerState::Prepared
            | PlayerState::Started
            | PlayerState::Paused
            | PlayerState::Stopped
            | PlayerState::PlaybackComplete
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_legal_sources_are_exact() {
        let sources = Operation::Start.legal_sources();
        assert_eq!(sources.len(), 4);
        for state in [
            PlayerState::Prepared,
            PlayerState::Started,
            PlayerState::Paused,
            PlayerState::PlaybackComplete,
        ] {
            assert!(Operation::Start.allowed_from(state));
        }
        assert!(!Operation::Start.allowed_from(PlayerState::Idle));
        assert!(!Operation::Start.allowed_from(PlayerState::Preparing));
        assert!(!Operation::Start.allowed_from(PlayerState::Error));
    }

    #[test]
    fn set_source_only_from_idle() {
        for state in ALL_STATES {
            assert_eq!(
                Operation::SetSource.allowed_from(state),
                state == PlayerState::Idle
            );
        }
    }

    #[test]
    fn reset_legal_everywhere() {
        for state in ALL_STATES {
            assert!(Operation::Reset.allowed_from(state));
        }
    }

    #[test]
    fn nothing_but_reset_is_legal_in_error() {
        for op in ALL_OPERATIONS {
            assert_eq!(
                op.allowed_from(PlayerState::Error),
                op == Operation::Reset,
                "operation {:?}",
                op
            );
        }
    }

    #[test]
    fn parameter_setters_share_gating() {
        for state in ALL_STATES {
            let volume = Operation::SetVolume.allowed_from(state);
            assert_eq!(Operation::SetLooping.allowed_from(state), volume);
            assert_eq!(Operation::SetRate.allowed_from(state), volume);
        }
        assert!(!Operation::SetVolume.allowed_from(PlayerState::Preparing));
        assert!(!Operation::SetVolume.allowed_from(PlayerState::Error));
    }

    #[test]
    fn duration_query_states() {
        assert!(duration_queryable(PlayerState::Prepared));
        assert!(duration_queryable(PlayerState::Stopped));
        assert!(!duration_queryable(PlayerState::Idle));
        assert!(!duration_queryable(PlayerState::Preparing));
        assert!(!duration_queryable(PlayerState::Error));
    }
}
