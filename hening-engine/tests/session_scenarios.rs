//! End-to-end session scenarios
//!
//! Each test drives a real session actor on tokio's paused clock against the
//! recording backend. With a 5 s lead-in and 1 s tick, lead-in ticks land on
//! t = 1..5 and running ticks on t = 6, 7, ...; the tests sample state half
//! a second after a tick.

mod helpers;

use helpers::{advance, start_engine, VoiceOp};
use hening_engine::{Offset, PlayerState, SessionEvent, SessionPhase};
use std::time::Duration;
use tokio::sync::broadcast;

fn drain(events: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn bells(events: &[SessionEvent]) -> Vec<(Offset, u64)> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::BellFired {
                offset,
                elapsed_seconds,
                ..
            } => Some((*offset, *elapsed_seconds)),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_start_and_end_bells_with_rain() {
    let (backend, pool, engine) = start_engine().await;
    let bell = pool.get("Aura Chime");
    let rain = pool.get("Rain");

    let session = engine
        .start(10, "Aura Chime", "Rain", [Offset::Start, Offset::End])
        .unwrap();
    let mut events = session.subscribe();

    // Still preparing: nothing plays yet
    advance(4.5).await;
    assert_eq!(session.snapshot().phase, SessionPhase::Preparing);
    assert_eq!(session.snapshot().lead_remaining, 1);
    assert_eq!(rain.query_state().await, PlayerState::Idle);
    assert_eq!(bell.play_requests(), 0);

    // Running entry rings the Start bell and starts the ambiance
    advance(1.0).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Running);
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert_eq!(bell.play_requests(), 1);
    assert_eq!(rain.query_state().await, PlayerState::Playing);

    advance(5.0).await;
    assert_eq!(session.snapshot().elapsed_seconds, 5);
    assert_eq!(rain.query_state().await, PlayerState::Playing);

    assert_eq!(session.finished().await, SessionPhase::Completed);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Completed);
    assert_eq!(snapshot.elapsed_seconds, 10);
    assert_eq!(snapshot.fired_offsets, vec![Offset::Start, Offset::End]);

    // Ambiance played once, without interruption, and was released at the end
    let status = rain.status().await;
    assert_eq!(status.state, PlayerState::Idle);
    assert_eq!(status.position, Duration::ZERO);
    assert_eq!(
        backend.ops("Rain"),
        vec![
            VoiceOp::Play { looping: true },
            VoiceOp::Stop,
            VoiceOp::Seek(Duration::ZERO)
        ]
    );

    // Second fire restarts the bell instead of layering it
    bell.settle().await;
    assert_eq!(
        backend.ops("Aura Chime"),
        vec![
            VoiceOp::Seek(Duration::ZERO),
            VoiceOp::Play { looping: false },
            VoiceOp::Stop,
            VoiceOp::Seek(Duration::ZERO),
            VoiceOp::Play { looping: false },
        ]
    );

    let snapshot = session.acknowledge().await;
    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.fired_offsets.is_empty());

    let events = drain(&mut events);
    assert_eq!(bells(&events), vec![(Offset::Start, 0), (Offset::End, 10)]);
    assert!(matches!(events.first(), Some(SessionEvent::Started { .. })));
    assert!(matches!(events.last(), Some(SessionEvent::Dismissed { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_middle_bell_excludes_pause_time() {
    let (backend, pool, engine) = start_engine().await;
    let bell = pool.get("Zen Whisper");

    let session = engine
        .start(20, "Zen Whisper", "No Sound", [Offset::Middle])
        .unwrap();

    advance(10.5).await;
    let snapshot = session.pause().await;
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert_eq!(snapshot.elapsed_seconds, 5);

    advance(60.0).await;
    assert_eq!(session.snapshot().elapsed_seconds, 5);
    assert_eq!(bell.play_requests(), 0);

    let snapshot = session.resume().await;
    assert_eq!(snapshot.phase, SessionPhase::Running);
    assert_eq!(snapshot.elapsed_seconds, 5);

    // Ticks resume a full second after resume
    advance(4.5).await;
    assert_eq!(session.snapshot().elapsed_seconds, 9);
    assert_eq!(bell.play_requests(), 0);

    advance(1.0).await;
    assert_eq!(session.snapshot().elapsed_seconds, 10);
    assert_eq!(bell.play_requests(), 1);

    assert_eq!(session.finished().await, SessionPhase::Completed);
    assert_eq!(bell.play_requests(), 1);

    // "No Sound" ambiance: no ambiance voice ever received a command
    for name in ["Rain", "Campfire", "Wind Chimes"] {
        assert!(backend.ops(name).is_empty(), "{} was touched", name);
    }
}

#[tokio::test(start_paused = true)]
async fn test_none_offset_never_rings() {
    let (backend, pool, engine) = start_engine().await;
    let bell = pool.get("Aura Chime");

    let session = engine
        .start(30, "Aura Chime", "Campfire", [Offset::None])
        .unwrap();
    assert_eq!(session.finished().await, SessionPhase::Completed);

    assert_eq!(bell.play_requests(), 0);
    assert!(backend.ops("Aura Chime").is_empty());
    assert_eq!(backend.play_count("Campfire"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_none_overrides_other_offsets() {
    let (backend, pool, engine) = start_engine().await;
    let bell = pool.get("Celestial Ring");

    let session = engine
        .start(
            8,
            "Celestial Ring",
            "Rain",
            [Offset::Start, Offset::Middle, Offset::End, Offset::None],
        )
        .unwrap();
    assert_eq!(session.finished().await, SessionPhase::Completed);

    assert_eq!(bell.play_requests(), 0);
    assert_eq!(backend.play_count("Celestial Ring"), 0);
    assert!(session.snapshot().fired_offsets.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_declined_stop_continues_session() {
    let (_backend, pool, engine) = start_engine().await;
    let rain = pool.get("Rain");

    let session = engine
        .start(15, "Aura Chime", "Rain", [Offset::Start, Offset::End])
        .unwrap();

    advance(8.5).await;
    assert_eq!(session.snapshot().elapsed_seconds, 3);

    let snapshot = session.request_stop().await;
    assert_eq!(snapshot.phase, SessionPhase::Paused);
    assert!(snapshot.pending_confirmation);
    assert_eq!(rain.query_state().await, PlayerState::Paused);

    // Nothing advances while the question is open
    advance(30.0).await;
    assert_eq!(session.snapshot().elapsed_seconds, 3);

    let snapshot = session.confirm_stop(false).await;
    assert_eq!(snapshot.phase, SessionPhase::Running);
    assert_eq!(snapshot.elapsed_seconds, 3);
    assert!(!snapshot.pending_confirmation);
    assert_eq!(rain.query_state().await, PlayerState::Playing);

    assert_eq!(session.finished().await, SessionPhase::Completed);
    assert_eq!(session.snapshot().elapsed_seconds, 15);
    assert_eq!(
        session.snapshot().fired_offsets,
        vec![Offset::Start, Offset::End]
    );
}

#[tokio::test(start_paused = true)]
async fn test_confirmed_stop_tears_down() {
    let (backend, pool, engine) = start_engine().await;
    let rain = pool.get("Rain");

    let session = engine
        .start(15, "Aura Chime", "Rain", [Offset::Start, Offset::End])
        .unwrap();
    let mut events = session.subscribe();

    advance(8.5).await;
    session.request_stop().await;
    let snapshot = session.confirm_stop(true).await;

    assert_eq!(snapshot.phase, SessionPhase::Idle);
    assert!(snapshot.fired_offsets.is_empty());
    assert_eq!(snapshot.elapsed_seconds, 0);
    assert!(!snapshot.pending_confirmation);

    let status = rain.status().await;
    assert_eq!(status.state, PlayerState::Idle);
    assert_eq!(status.position, Duration::ZERO);
    assert_eq!(
        backend.ops("Rain"),
        vec![
            VoiceOp::Play { looping: true },
            VoiceOp::Pause,
            VoiceOp::Stop,
            VoiceOp::Seek(Duration::ZERO)
        ]
    );

    assert_eq!(session.finished().await, SessionPhase::Cancelled);
    assert!(!engine.is_active());

    let events = drain(&mut events);
    let kinds: Vec<&str> = events.iter().map(SessionEvent::event_type).collect();
    assert!(kinds.ends_with(&["Paused", "ConfirmationRequested", "Cancelled", "Dismissed"]));
    assert_eq!(bells(&events), vec![(Offset::Start, 0)]);

    // Engine accepts the next session straight away
    let next = engine.start(5, "Aura Chime", "Rain", [Offset::End]).unwrap();
    assert_eq!(next.snapshot().phase, SessionPhase::Preparing);
}
