// Live feed connection manager
//
// Owns the single socket for one feed, its heartbeat, its reconnect
// backoff, and its inactivity clock. The manager is an explicit object
// driven by a control channel - no module-level socket globals - and it
// holds at most one connection at a time: opening while connected closes
// the old socket with the superseded code before the new dial starts.
//
// Close discipline: codes 4000 (teardown: explicit close or inactivity)
// and 4001 (superseded by a new open) are intentional - no reconnect, no
// error state. Any other close schedules a reconnect after
// min(1000 * 2^attempt, 30000) ms.
//
// Heartbeat pongs are consumed but not deadline-checked; a dead connection
// is noticed when the transport reports closure.

pub mod protocol;
pub mod transport;

use crate::events::{FeedStatus, SyncEvent};
use protocol::{parse_frame, FeedKind, InboundFrame, PING_FRAME};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant};
use transport::{FeedConn, FeedTransport, Frame, Outbound};

/// Intentional close: explicit disconnect or inactivity teardown.
pub const CLOSE_TEARDOWN: u16 = 4000;
/// Intentional close: the connection is being replaced by a new open.
pub const CLOSE_SUPERSEDED: u16 = 4001;

/// Heartbeat cadence while the socket is open.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
/// A connection idle of user input this long is torn down, not recycled.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300);

const RECONNECT_BASE_MS: u64 = 1000;
const RECONNECT_CAP_MS: u64 = 30_000;

/// Backoff before reconnect attempt `attempt` (0-based):
/// `min(1000 * 2^attempt, 30000)` milliseconds.
pub fn reconnect_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(RECONNECT_BASE_MS.saturating_mul(factor).min(RECONNECT_CAP_MS))
}

/// Whether a close code came from our own intentional set.
pub fn is_intentional_close(code: u16) -> bool {
    code == CLOSE_TEARDOWN || code == CLOSE_SUPERSEDED
}

/// Feed URL helpers.
pub fn activity_url(ws_base: &str) -> String {
    format!("{}/ws/activity/today/", ws_base.trim_end_matches('/'))
}

pub fn waiting_page_url(ws_base: &str, email: &str) -> String {
    format!("{}/ws/waitingpage/{}/", ws_base.trim_end_matches('/'), email)
}

/// Control messages from the owner (the TUI side).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedControl {
    /// Connect; supersedes any live connection.
    Open,
    /// Intentional disconnect; no reconnect.
    Close,
    /// A user input event - resets the inactivity clock.
    Activity,
    /// Shut the manager down for good.
    Dispose,
}

/// Cheap cloneable handle for driving a manager.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    ctrl_tx: mpsc::Sender<FeedControl>,
}

impl FeedHandle {
    pub fn open(&self) {
        let _ = self.ctrl_tx.try_send(FeedControl::Open);
    }

    pub fn close(&self) {
        let _ = self.ctrl_tx.try_send(FeedControl::Close);
    }

    /// Record user activity. Called on every input event; dropping a tick
    /// under burst is fine, the next one lands.
    pub fn touch(&self) {
        let _ = self.ctrl_tx.try_send(FeedControl::Activity);
    }

    pub fn dispose(&self) {
        let _ = self.ctrl_tx.try_send(FeedControl::Dispose);
    }
}

/// How a served connection ended.
enum SessionEnd {
    /// Intentional close; settle back to idle.
    Intentional,
    /// Open arrived while connected; reconnect immediately.
    Superseded,
    /// Transport loss or abnormal close; reconnect with backoff.
    Involuntary(String),
    /// Dispose arrived; the manager exits.
    Disposed,
}

/// Outcome of waiting out a backoff delay.
enum BackoffEnd {
    Retry,
    Cancelled,
    Reopen,
    Disposed,
}

/// The connection manager for one feed.
pub struct FeedManager<T: FeedTransport> {
    transport: T,
    url: String,
    kind: FeedKind,
    events: mpsc::Sender<SyncEvent>,
}

impl<T: FeedTransport> FeedManager<T> {
    pub fn new(
        transport: T,
        url: String,
        kind: FeedKind,
        events: mpsc::Sender<SyncEvent>,
    ) -> (Self, FeedHandle, mpsc::Receiver<FeedControl>) {
        let (ctrl_tx, ctrl_rx) = mpsc::channel(64);
        (
            Self {
                transport,
                url,
                kind,
                events,
            },
            FeedHandle { ctrl_tx },
            ctrl_rx,
        )
    }

    async fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event).await;
    }

    async fn emit_status(&self, status: FeedStatus) {
        self.emit(SyncEvent::Feed(status)).await;
    }

    /// Run the manager until disposed. Idle until an Open arrives, then
    /// hold exactly one connection, reconnecting on involuntary loss.
    pub async fn run(mut self, mut ctrl_rx: mpsc::Receiver<FeedControl>) {
        'idle: loop {
            match ctrl_rx.recv().await {
                Some(FeedControl::Open) => {}
                Some(FeedControl::Close) | Some(FeedControl::Activity) => continue 'idle,
                Some(FeedControl::Dispose) | None => return,
            }

            let mut attempt: u32 = 0;
            'session: loop {
                self.emit_status(FeedStatus::Connecting).await;

                let conn = match self.transport.dial(&self.url).await {
                    Ok(conn) => conn,
                    Err(err) => {
                        self.emit_status(FeedStatus::Error(format!("{err:#}"))).await;
                        match self.backoff(&mut attempt, &mut ctrl_rx).await {
                            BackoffEnd::Retry => continue 'session,
                            BackoffEnd::Reopen => {
                                attempt = 0;
                                continue 'session;
                            }
                            BackoffEnd::Cancelled => continue 'idle,
                            BackoffEnd::Disposed => return,
                        }
                    }
                };

                attempt = 0;
                self.emit_status(FeedStatus::Connected).await;

                match self.serve(conn, &mut ctrl_rx).await {
                    SessionEnd::Intentional => {
                        self.emit_status(FeedStatus::Disconnected).await;
                        continue 'idle;
                    }
                    SessionEnd::Superseded => continue 'session,
                    SessionEnd::Involuntary(reason) => {
                        self.emit_status(FeedStatus::Error(reason)).await;
                        match self.backoff(&mut attempt, &mut ctrl_rx).await {
                            BackoffEnd::Retry => continue 'session,
                            BackoffEnd::Reopen => {
                                attempt = 0;
                                continue 'session;
                            }
                            BackoffEnd::Cancelled => continue 'idle,
                            BackoffEnd::Disposed => return,
                        }
                    }
                    SessionEnd::Disposed => return,
                }
            }
        }
    }

    /// Serve one live connection: route frames, heartbeat, watch the
    /// inactivity clock, and obey control messages.
    async fn serve(&mut self, mut conn: FeedConn, ctrl_rx: &mut mpsc::Receiver<FeedControl>) -> SessionEnd {
        let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
        let inactivity = sleep(INACTIVITY_TIMEOUT);
        tokio::pin!(inactivity);

        loop {
            tokio::select! {
                frame = conn.rx.recv() => match frame {
                    Some(Frame::Text(text)) => self.handle_text(&text).await,
                    Some(Frame::Closed { code: Some(code) }) if is_intentional_close(code) => {
                        return SessionEnd::Intentional;
                    }
                    Some(Frame::Closed { code }) => {
                        let code = code.map_or_else(|| "abnormal".to_string(), |c| c.to_string());
                        return SessionEnd::Involuntary(format!("connection closed (code {code})"));
                    }
                    None => return SessionEnd::Involuntary("connection lost".to_string()),
                },

                _ = heartbeat.tick() => {
                    if conn.tx.send(Outbound::Text(PING_FRAME.to_string())).is_err() {
                        return SessionEnd::Involuntary("heartbeat send failed".to_string());
                    }
                }

                _ = &mut inactivity => {
                    tracing::info!("no user input for {INACTIVITY_TIMEOUT:?}; closing feed");
                    shutdown(&mut conn, CLOSE_TEARDOWN).await;
                    return SessionEnd::Intentional;
                }

                ctrl = ctrl_rx.recv() => match ctrl {
                    Some(FeedControl::Activity) => {
                        inactivity.as_mut().reset(Instant::now() + INACTIVITY_TIMEOUT);
                    }
                    Some(FeedControl::Open) => {
                        // Replace this connection: close it intentionally
                        // before the caller dials again.
                        shutdown(&mut conn, CLOSE_SUPERSEDED).await;
                        return SessionEnd::Superseded;
                    }
                    Some(FeedControl::Close) => {
                        shutdown(&mut conn, CLOSE_TEARDOWN).await;
                        return SessionEnd::Intentional;
                    }
                    Some(FeedControl::Dispose) | None => {
                        shutdown(&mut conn, CLOSE_TEARDOWN).await;
                        return SessionEnd::Disposed;
                    }
                }
            }
        }
    }

    async fn handle_text(&self, text: &str) {
        match parse_frame(self.kind, text) {
            InboundFrame::Event(event) => self.emit(event).await,
            InboundFrame::Pong => {}
            InboundFrame::Ignored => {
                tracing::debug!("dropping unrecognized feed frame: {text}");
            }
        }
    }

    /// Wait out the backoff for the next reconnect attempt, still
    /// responsive to control messages.
    async fn backoff(&self, attempt: &mut u32, ctrl_rx: &mut mpsc::Receiver<FeedControl>) -> BackoffEnd {
        let delay = reconnect_delay(*attempt);
        *attempt += 1;
        self.emit_status(FeedStatus::Reconnecting {
            attempt: *attempt,
            delay_ms: delay.as_millis() as u64,
        })
        .await;

        let wait = sleep(delay);
        tokio::pin!(wait);
        loop {
            tokio::select! {
                _ = &mut wait => return BackoffEnd::Retry,
                ctrl = ctrl_rx.recv() => match ctrl {
                    Some(FeedControl::Activity) => continue,
                    Some(FeedControl::Open) => return BackoffEnd::Reopen,
                    Some(FeedControl::Close) => {
                        self.emit_status(FeedStatus::Disconnected).await;
                        return BackoffEnd::Cancelled;
                    }
                    Some(FeedControl::Dispose) | None => return BackoffEnd::Disposed,
                }
            }
        }
    }
}

/// Close the connection with an explicit code and wait for the pump to
/// hang up, so the close is on the wire before anything else happens.
async fn shutdown(conn: &mut FeedConn, code: u16) {
    let _ = conn.tx.send(Outbound::Close(code));
    while conn.rx.recv().await.is_some() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CounterKind;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Dial(u32),
        Sent(u32, String),
        Closed(u32, u16),
    }

    type Log = Arc<Mutex<Vec<Op>>>;

    /// One scripted connection: frames delivered in order, then the
    /// connection stays open serving the outbound channel.
    struct Script {
        frames: Vec<Frame>,
    }

    struct FakeTransport {
        scripts: VecDeque<Script>,
        log: Log,
        dials: u32,
    }

    impl FakeTransport {
        fn new(scripts: Vec<Script>, log: Log) -> Self {
            Self {
                scripts: scripts.into(),
                log,
                dials: 0,
            }
        }
    }

    #[async_trait]
    impl FeedTransport for FakeTransport {
        async fn dial(&mut self, _url: &str) -> anyhow::Result<FeedConn> {
            let Some(script) = self.scripts.pop_front() else {
                return Err(anyhow!("no scripted connection left"));
            };
            self.dials += 1;
            let id = self.dials;
            self.log.lock().unwrap().push(Op::Dial(id));

            let (out_tx, mut out_rx) = mpsc::unbounded_channel();
            let (in_tx, in_rx) = mpsc::channel(64);
            let log = self.log.clone();
            tokio::spawn(async move {
                for frame in script.frames {
                    let ends = matches!(frame, Frame::Closed { .. });
                    if in_tx.send(frame).await.is_err() {
                        return;
                    }
                    if ends {
                        return;
                    }
                }
                while let Some(out) = out_rx.recv().await {
                    match out {
                        Outbound::Text(text) => log.lock().unwrap().push(Op::Sent(id, text)),
                        Outbound::Close(code) => {
                            log.lock().unwrap().push(Op::Closed(id, code));
                            return;
                        }
                    }
                }
            });

            Ok(FeedConn {
                tx: out_tx,
                rx: in_rx,
            })
        }
    }

    struct Rig {
        handle: FeedHandle,
        events: mpsc::Receiver<SyncEvent>,
        log: Log,
    }

    fn rig(scripts: Vec<Script>) -> Rig {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (events_tx, events) = mpsc::channel(256);
        let transport = FakeTransport::new(scripts, log.clone());
        let (manager, handle, ctrl_rx) =
            FeedManager::new(transport, "ws://test/feed".into(), FeedKind::Activity, events_tx);
        tokio::spawn(manager.run(ctrl_rx));
        Rig {
            handle,
            events,
            log,
        }
    }

    async fn next_status(events: &mut mpsc::Receiver<SyncEvent>) -> FeedStatus {
        loop {
            match events.recv().await.expect("event stream ended") {
                SyncEvent::Feed(status) => return status,
                _ => continue,
            }
        }
    }

    fn dial_count(log: &Log) -> usize {
        log.lock()
            .unwrap()
            .iter()
            .filter(|op| matches!(op, Op::Dial(_)))
            .count()
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        assert_eq!(reconnect_delay(0), Duration::from_millis(1000));
        assert_eq!(reconnect_delay(1), Duration::from_millis(2000));
        assert_eq!(reconnect_delay(2), Duration::from_millis(4000));
        assert_eq!(reconnect_delay(4), Duration::from_millis(16_000));
        assert_eq!(reconnect_delay(5), Duration::from_millis(30_000));
        assert_eq!(reconnect_delay(20), Duration::from_millis(30_000));
        // Never decreases, even past any shift overflow.
        let mut last = Duration::ZERO;
        for attempt in 0..80 {
            let delay = reconnect_delay(attempt);
            assert!(delay >= last);
            last = delay;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn counter_frames_reach_the_event_channel() {
        let mut rig = rig(vec![Script {
            frames: vec![
                Frame::Text(r#"{"update_type":"active_users","count":42}"#.into()),
                Frame::Text("not a frame".into()),
                Frame::Text(r#"{"update_type":"petitioners","count":7}"#.into()),
            ],
        }]);
        rig.handle.open();

        let mut counters = Vec::new();
        while counters.len() < 2 {
            if let SyncEvent::Counter { kind, value } = rig.events.recv().await.unwrap() {
                counters.push((kind, value));
            }
        }
        // The malformed frame was dropped, not surfaced.
        assert_eq!(
            counters,
            vec![(CounterKind::ActiveUsers, 42), (CounterKind::Petitioners, 7)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_pings_every_fifteen_seconds() {
        let mut rig = rig(vec![Script { frames: vec![] }]);
        rig.handle.open();

        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        tokio::time::sleep(Duration::from_secs(31)).await;
        let pings = rig
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|op| matches!(op, Op::Sent(_, text) if text == PING_FRAME))
            .count();
        assert_eq!(pings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn abnormal_close_sets_error_and_schedules_backoff() {
        let mut rig = rig(vec![
            Script {
                frames: vec![Frame::Closed { code: Some(1006) }],
            },
            Script { frames: vec![] },
        ]);
        rig.handle.open();

        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);
        match next_status(&mut rig.events).await {
            FeedStatus::Error(reason) => assert!(reason.contains("1006")),
            other => panic!("expected an error status, got {other:?}"),
        }
        assert_eq!(
            next_status(&mut rig.events).await,
            FeedStatus::Reconnecting {
                attempt: 1,
                delay_ms: 1000
            }
        );
        // After the backoff the manager dials again.
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);
        assert_eq!(dial_count(&rig.log), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn intentional_server_close_does_not_reconnect() {
        let mut rig = rig(vec![Script {
            frames: vec![Frame::Closed { code: Some(4000) }],
        }]);
        rig.handle.open();

        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Disconnected);

        // Give any (incorrect) reconnect plenty of paused time to show up.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(dial_count(&rig.log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn open_supersedes_the_live_connection_before_redialing() {
        let mut rig = rig(vec![Script { frames: vec![] }, Script { frames: vec![] }]);
        rig.handle.open();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        rig.handle.open();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        let log = rig.log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                Op::Dial(1),
                Op::Closed(1, CLOSE_SUPERSEDED),
                Op::Dial(2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_close_is_intentional() {
        let mut rig = rig(vec![Script { frames: vec![] }]);
        rig.handle.open();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        rig.handle.close();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Disconnected);

        tokio::time::sleep(Duration::from_secs(120)).await;
        let log = rig.log.lock().unwrap().clone();
        assert!(log.contains(&Op::Closed(1, CLOSE_TEARDOWN)));
        assert_eq!(dial_count(&rig.log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn inactivity_tears_down_without_reconnect() {
        let mut rig = rig(vec![Script { frames: vec![] }]);
        rig.handle.open();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        tokio::time::sleep(INACTIVITY_TIMEOUT + Duration::from_secs(1)).await;
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Disconnected);

        let log = rig.log.lock().unwrap().clone();
        assert!(log.contains(&Op::Closed(1, CLOSE_TEARDOWN)));
        assert_eq!(dial_count(&rig.log), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn user_activity_defers_the_inactivity_teardown() {
        let mut rig = rig(vec![Script { frames: vec![] }]);
        rig.handle.open();
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connecting);
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Connected);

        // Touch at the four-minute mark; the deadline moves to nine.
        tokio::time::sleep(Duration::from_secs(240)).await;
        rig.handle.touch();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(
            !rig.log
                .lock()
                .unwrap()
                .iter()
                .any(|op| matches!(op, Op::Closed(_, _))),
            "connection was torn down despite recent activity"
        );

        tokio::time::sleep(Duration::from_secs(240)).await;
        assert_eq!(next_status(&mut rig.events).await, FeedStatus::Disconnected);
        assert!(rig
            .log
            .lock()
            .unwrap()
            .contains(&Op::Closed(1, CLOSE_TEARDOWN)));
    }
}
