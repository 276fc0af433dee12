// Live feed wire protocol
//
// Inbound frames are JSON text. The activity feed delivers tagged counter
// updates; the waiting-page feed delivers verification status frames. Both
// answer our heartbeat with a pong. Anything else is dropped by the
// manager (logged at debug), never surfaced as an error.

use crate::events::{CounterKind, SyncEvent, VerificationUpdate};
use serde::Deserialize;

/// Heartbeat frame sent every `HEARTBEAT_INTERVAL` while the socket is open.
pub const PING_FRAME: &str = r#"{"type":"ping"}"#;

/// Which feed a connection serves, deciding how its frames are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// `/ws/activity/today/` - live counter updates.
    Activity,
    /// `/ws/waitingpage/{email}/` - verification status frames.
    WaitingPage,
}

/// A successfully classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Event(SyncEvent),
    Pong,
    /// Unrecognized shape; the manager logs and drops it.
    Ignored,
}

/// `{"update_type": "active_users"|"petitioners", "count": n}`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CounterFrame {
    update_type: CounterKind,
    count: u64,
}

/// `{"type": "pong"}`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlFrame {
    Pong,
}

/// Waiting-page status frames, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WaitingFrame {
    NoInitiatorStatus { status: bool },
    AdminVerification { verified: bool },
    VerificationSuccess,
    CleanupDone,
    Pong,
}

/// Classify one inbound text frame for the given feed.
pub fn parse_frame(kind: FeedKind, text: &str) -> InboundFrame {
    match kind {
        FeedKind::Activity => {
            if let Ok(frame) = serde_json::from_str::<CounterFrame>(text) {
                return InboundFrame::Event(SyncEvent::Counter {
                    kind: frame.update_type,
                    value: frame.count,
                });
            }
            if serde_json::from_str::<ControlFrame>(text).is_ok() {
                return InboundFrame::Pong;
            }
            InboundFrame::Ignored
        }
        FeedKind::WaitingPage => match serde_json::from_str::<WaitingFrame>(text) {
            Ok(WaitingFrame::NoInitiatorStatus { status }) => InboundFrame::Event(
                SyncEvent::Verification(VerificationUpdate::NoInitiatorStatus(status)),
            ),
            Ok(WaitingFrame::AdminVerification { verified }) => InboundFrame::Event(
                SyncEvent::Verification(VerificationUpdate::AdminVerification(verified)),
            ),
            Ok(WaitingFrame::VerificationSuccess) => InboundFrame::Event(SyncEvent::Verification(
                VerificationUpdate::VerificationSuccess,
            )),
            Ok(WaitingFrame::CleanupDone) => {
                InboundFrame::Event(SyncEvent::Verification(VerificationUpdate::CleanupAck))
            }
            Ok(WaitingFrame::Pong) => InboundFrame::Pong,
            Err(_) => InboundFrame::Ignored,
        },
    }
}
