//! Lifecycle tests for the playback controller.
//!
//! These drive a controller against the scriptable bridge mocks and verify
//! the legality table, transition destinations, and error handling.

#[cfg(test)]
mod tests {
    use bridge_traits::mock::{EngineCommand, MockAudioEngine, MockFocusProvider, MockSampleLoader};
    use bridge_traits::{EngineEvent, SystemClock};
    use core_playback::{
        PlaybackController, PlaybackError, PlayerConfig, PlayerEvent, PlayerState, Operation,
        SampleCache, ALL_OPERATIONS, ALL_STATES,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::time::{sleep, Instant};

    struct Harness {
        player: PlaybackController,
        engine: Arc<MockAudioEngine>,
        loader: Arc<MockSampleLoader>,
        focus: Arc<MockFocusProvider>,
        cache: Arc<Mutex<SampleCache>>,
    }

    async fn harness_with(config: PlayerConfig) -> Harness {
        let engine = Arc::new(MockAudioEngine::new());
        let loader = Arc::new(MockSampleLoader::new());
        let focus = Arc::new(MockFocusProvider::new());
        let cache = Arc::new(Mutex::new(
            SampleCache::new(config.cache_capacity, loader.clone()).expect("cache"),
        ));
        let player = PlaybackController::new(
            "test-player",
            engine.clone(),
            cache.clone(),
            focus.clone(),
            Arc::new(SystemClock),
            config,
        )
        .await
        .expect("controller");
        Harness {
            player,
            engine,
            loader,
            focus,
            cache,
        }
    }

    async fn harness() -> Harness {
        harness_with(PlayerConfig::default()).await
    }

    async fn wait_for_state(player: &PlaybackController, expected: PlayerState) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let current = player.state().await;
            if current == expected {
                return;
            }
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {expected:?}, still {current:?}"
            );
            sleep(Duration::from_millis(5)).await;
        }
    }

    /// Walk the harness into `target` through legal operations and scripted
    /// engine callbacks.
    async fn drive_to(h: &Harness, target: PlayerState) {
        match target {
            PlayerState::Idle => {}
            PlayerState::Initialized => {
                h.player.set_source("chime".into()).await.unwrap();
            }
            PlayerState::Preparing => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare_async().await.unwrap();
            }
            PlayerState::Prepared => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare().await.unwrap();
            }
            PlayerState::Started => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare().await.unwrap();
                h.player.start().await.unwrap();
            }
            PlayerState::Paused => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare().await.unwrap();
                h.player.start().await.unwrap();
                h.player.pause().await.unwrap();
            }
            PlayerState::Stopped => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare().await.unwrap();
                h.player.stop().await.unwrap();
            }
            PlayerState::PlaybackComplete => {
                h.player.set_source("chime".into()).await.unwrap();
                h.player.prepare().await.unwrap();
                h.player.start().await.unwrap();
                h.engine.emit(EngineEvent::Completed);
                wait_for_state(&h.player, PlayerState::PlaybackComplete).await;
            }
            PlayerState::Error => {
                h.engine.emit(EngineEvent::Error { code: 1, extra: 0 });
                wait_for_state(&h.player, PlayerState::Error).await;
            }
        }
        assert_eq!(h.player.state().await, target, "drive_to failed");
    }

    async fn invoke(player: &PlaybackController, op: Operation) -> core_playback::Result<()> {
        match op {
            Operation::SetSource => player.set_source("another".into()).await,
            Operation::Prepare => player.prepare().await,
            Operation::PrepareAsync => player.prepare_async().await,
            Operation::Start => player.start().await,
            Operation::Pause => player.pause().await,
            Operation::Stop => player.stop().await,
            Operation::SeekTo => player.seek_to(Duration::from_millis(100)).await,
            Operation::SetLooping => player.set_looping(true).await,
            Operation::SetVolume => player.set_volume(0.5).await,
            Operation::SetRate => player.set_rate(1.5).await,
            Operation::Reset => player.reset().await,
        }
    }

    #[tokio::test]
    async fn illegal_operations_reject_and_leave_state_unchanged() {
        for state in ALL_STATES {
            for op in ALL_OPERATIONS {
                if op.allowed_from(state) {
                    continue;
                }

                let h = harness().await;
                drive_to(&h, state).await;

                match invoke(&h.player, op).await {
                    Err(PlaybackError::InvalidState {
                        operation,
                        state: reported,
                    }) => {
                        assert_eq!(operation, op.name());
                        assert_eq!(reported, state);
                    }
                    other => panic!("{op:?} from {state:?} should be rejected, got {other:?}"),
                }
                assert_eq!(h.player.state().await, state);
            }
        }
    }

    #[tokio::test]
    async fn start_reaches_started_from_every_legal_source() {
        for state in Operation::Start.legal_sources() {
            let h = harness().await;
            drive_to(&h, *state).await;
            h.player.start().await.unwrap();
            assert_eq!(h.player.state().await, PlayerState::Started);
        }
    }

    #[tokio::test]
    async fn start_while_started_skips_the_engine() {
        let h = harness().await;
        drive_to(&h, PlayerState::Started).await;
        h.player.start().await.unwrap();

        let starts = h.engine.count(|c| matches!(c, EngineCommand::Start));
        assert_eq!(starts, 1);
    }

    #[tokio::test]
    async fn concurrent_start_invokes_engine_exactly_once() {
        let h = harness().await;
        drive_to(&h, PlayerState::Prepared).await;

        let (a, b) = tokio::join!(h.player.start(), h.player.start());
        a.unwrap();
        b.unwrap();

        let starts = h.engine.count(|c| matches!(c, EngineCommand::Start));
        assert_eq!(starts, 1);
        assert_eq!(h.player.state().await, PlayerState::Started);
    }

    #[tokio::test]
    async fn rejected_operation_is_published() {
        let h = harness().await;
        let mut events = h.player.subscribe();

        let err = h.player.start().await.unwrap_err();
        assert!(err.is_protocol_violation());

        assert_eq!(
            events.recv().await.unwrap(),
            PlayerEvent::OperationRejected {
                operation: Operation::Start,
                state: PlayerState::Idle,
            }
        );
    }

    #[tokio::test]
    async fn strict_mode_panics_on_protocol_violation() {
        let h = Arc::new(harness_with(PlayerConfig::default().with_strict_mode(true)).await);

        let task = {
            let h = h.clone();
            tokio::spawn(async move { h.player.start().await })
        };
        let joined = task.await;
        assert!(joined.unwrap_err().is_panic());
    }

    #[tokio::test]
    async fn set_source_load_failure_moves_to_error() {
        let h = harness().await;
        h.loader.fail_on("missing");

        let err = h.player.set_source("missing".into()).await.unwrap_err();
        assert!(matches!(err, PlaybackError::LoadFailed { .. }));
        assert_eq!(h.player.state().await, PlayerState::Error);
        assert!(h.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn prepare_timeout_fails_into_error() {
        let h = harness_with(
            PlayerConfig::default().with_prepare_timeout(Duration::from_millis(50)),
        )
        .await;
        h.engine.hang_on("prepare");

        h.player.set_source("chime".into()).await.unwrap();
        let err = h.player.prepare().await.unwrap_err();
        assert!(matches!(err, PlaybackError::Timeout { .. }));
        assert!(err.is_fatal());
        assert_eq!(h.player.state().await, PlayerState::Error);
    }

    #[tokio::test]
    async fn async_prepare_completes_via_callback() {
        let h = harness().await;
        drive_to(&h, PlayerState::Preparing).await;

        h.engine.emit(EngineEvent::Prepared);
        wait_for_state(&h.player, PlayerState::Prepared).await;

        h.player.start().await.unwrap();
        assert_eq!(h.player.state().await, PlayerState::Started);
    }

    #[tokio::test]
    async fn async_prepare_watchdog_fails_into_error() {
        let h = harness_with(
            PlayerConfig::default().with_prepare_timeout(Duration::from_millis(50)),
        )
        .await;

        h.player.set_source("chime".into()).await.unwrap();
        h.player.prepare_async().await.unwrap();
        assert_eq!(h.player.state().await, PlayerState::Preparing);

        wait_for_state(&h.player, PlayerState::Error).await;
    }

    #[tokio::test]
    async fn completion_callback_allows_replay() {
        let h = harness().await;
        drive_to(&h, PlayerState::PlaybackComplete).await;

        h.player.start().await.unwrap();
        assert_eq!(h.player.state().await, PlayerState::Started);
    }

    #[tokio::test]
    async fn engine_fault_is_published_and_reset_recovers() {
        let h = harness().await;
        let mut events = h.player.subscribe();
        drive_to(&h, PlayerState::Error).await;

        loop {
            match events.recv().await.unwrap() {
                PlayerEvent::EngineFault { code, extra } => {
                    assert_eq!((code, extra), (1, 0));
                    break;
                }
                _ => continue,
            }
        }

        h.player.reset().await.unwrap();
        assert_eq!(h.player.state().await, PlayerState::Idle);

        // Controller is usable again after reset.
        h.player.play("chime".into()).await.unwrap();
        assert_eq!(h.player.state().await, PlayerState::Started);
    }

    #[tokio::test]
    async fn position_is_zero_in_error_state() {
        let h = harness().await;
        h.engine.set_position(Duration::from_secs(7));
        drive_to(&h, PlayerState::Error).await;

        assert_eq!(h.player.position().await.unwrap(), Duration::ZERO);
    }

    #[tokio::test]
    async fn duration_is_only_reported_when_queryable() {
        let h = harness().await;
        h.engine.set_duration(Some(Duration::from_secs(3)));

        assert_eq!(h.player.duration().await.unwrap(), None);

        drive_to(&h, PlayerState::Prepared).await;
        assert_eq!(
            h.player.duration().await.unwrap(),
            Some(Duration::from_secs(3))
        );
    }

    #[tokio::test]
    async fn balance_formula_drives_channel_gains() {
        for balance in [0.0_f32, 0.5, 1.0, 1.5, 2.0] {
            let h = harness().await;
            let master = 0.8_f32;

            h.player.set_balance(balance).await.unwrap();
            h.player.set_volume(master).await.unwrap();

            let expected = if balance < 1.0 {
                (master, master * balance)
            } else {
                (master * (2.0 - balance), master)
            };
            assert_eq!(
                h.engine.last_volume(),
                Some(expected),
                "balance {balance}"
            );
        }
    }

    #[tokio::test]
    async fn rate_is_clamped_to_supported_range() {
        let h = harness().await;
        h.player.set_rate(5.0).await.unwrap();
        h.player.set_rate(0.0).await.unwrap();

        assert_eq!(
            h.engine.commands(),
            vec![
                EngineCommand::SetRate(2.0),
                EngineCommand::SetRate(0.01),
            ]
        );
    }

    #[tokio::test]
    async fn looping_flag_reaches_the_engine() {
        let h = harness().await;
        drive_to(&h, PlayerState::Prepared).await;
        h.player.set_looping(true).await.unwrap();

        let set = h
            .engine
            .count(|c| matches!(c, EngineCommand::SetLooping(true)));
        assert_eq!(set, 1);
        assert_eq!(h.player.state().await, PlayerState::Prepared);
    }

    #[tokio::test]
    async fn play_binds_prepares_and_starts() {
        let h = harness().await;
        let mut events = h.player.subscribe();

        h.player.play("chime".into()).await.unwrap();

        assert_eq!(h.player.state().await, PlayerState::Started);
        assert_eq!(h.player.current_resource().await, Some("chime".into()));
        assert!(h.player.is_playing().await);

        let commands = h.engine.commands();
        assert!(matches!(commands[0], EngineCommand::SetSource(_)));
        assert_eq!(commands[1], EngineCommand::Prepare);
        assert_eq!(commands[2], EngineCommand::Start);

        assert_eq!(
            events.recv().await.unwrap(),
            PlayerEvent::StateChanged {
                from: PlayerState::Idle,
                to: PlayerState::Initialized,
                operation: Some(Operation::SetSource),
            }
        );
    }

    #[tokio::test]
    async fn release_tears_everything_down() {
        let h = harness().await;
        drive_to(&h, PlayerState::Started).await;

        h.player.release().await;

        assert_eq!(h.player.state().await, PlayerState::Idle);
        assert_eq!(h.player.current_resource().await, None);
        assert!(h.cache.lock().await.is_empty());
        assert_eq!(h.engine.count(|c| matches!(c, EngineCommand::Stop)), 1);
        assert_eq!(h.engine.count(|c| matches!(c, EngineCommand::Release)), 1);
        assert_eq!(h.focus.abandon_count(), 1);
    }
}
