//! Countdown formatting for session views
//!
//! Host views render the remaining time of a session as `MM:SS`, switching to
//! `H:MM:SS` once the remainder reaches an hour. The preparation lead-in is
//! rendered as a short "Starting in N" prompt.

use crate::events::{SessionPhase, SessionSnapshot};

const SECONDS_PER_HOUR: u64 = 3600;

/// Format remaining seconds as a countdown.
///
/// # Examples
///
/// ```
/// use hening_common::human_time::format_countdown;
///
/// assert_eq!(format_countdown(0), "00:00");
/// assert_eq!(format_countdown(75), "01:15");
/// assert_eq!(format_countdown(3599), "59:59");
/// assert_eq!(format_countdown(3661), "1:01:01");
/// ```
pub fn format_countdown(seconds: u64) -> String {
    if seconds >= SECONDS_PER_HOUR {
        let hours = seconds / SECONDS_PER_HOUR;
        let mins = (seconds % SECONDS_PER_HOUR) / 60;
        let secs = seconds % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Render the text a session view shows for a snapshot
pub fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let preparing = snapshot.phase == SessionPhase::Preparing
        || (snapshot.phase == SessionPhase::Paused
            && snapshot.paused_from == Some(SessionPhase::Preparing));

    if preparing {
        format!("Starting in {}", snapshot.lead_remaining)
    } else {
        format_countdown(snapshot.seconds_remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_countdown() {
        assert_eq!(format_countdown(5), "00:05");
        assert_eq!(format_countdown(60), "01:00");
        assert_eq!(format_countdown(600), "10:00");
    }

    #[test]
    fn test_hour_countdown() {
        assert_eq!(format_countdown(3600), "1:00:00");
        assert_eq!(format_countdown(7322), "2:02:02");
    }

    #[test]
    fn test_snapshot_preparing() {
        let snapshot = SessionSnapshot {
            phase: SessionPhase::Preparing,
            lead_remaining: 4,
            seconds_remaining: 4,
            ..SessionSnapshot::default()
        };
        assert_eq!(format_snapshot(&snapshot), "Starting in 4");
    }

    #[test]
    fn test_snapshot_paused_while_preparing() {
        let snapshot = SessionSnapshot {
            phase: SessionPhase::Paused,
            paused_from: Some(SessionPhase::Preparing),
            lead_remaining: 2,
            seconds_remaining: 2,
            ..SessionSnapshot::default()
        };
        assert_eq!(format_snapshot(&snapshot), "Starting in 2");
    }

    #[test]
    fn test_snapshot_running() {
        let snapshot = SessionSnapshot {
            phase: SessionPhase::Running,
            elapsed_seconds: 30,
            seconds_remaining: 570,
            ..SessionSnapshot::default()
        };
        assert_eq!(format_snapshot(&snapshot), "09:30");
    }
}
