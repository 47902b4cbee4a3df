use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use anyhow::bail;
use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;
use crate::io_result::IoResult;
use crate::transport::{ConnectionId, Transport};

/// An in-memory [Transport] with scripted connect results, for tests that need behaviour over
///  time (waiting for data, reconnecting) which is awkward to express with mock expectations.
#[derive(Default)]
pub struct FakeTransport {
    state: Mutex<FakeState>,
    changed: Notify,
}

#[derive(Default)]
struct FakeState {
    /// results of upcoming connect attempts - connecting succeeds once this is exhausted
    connect_script: VecDeque<bool>,
    connect_attempts: Vec<Instant>,
    readable_calls: Vec<Instant>,
    connection: Option<ConnectionId>,
    num_connects: ConnectionId,
    need_reset: bool,
    reset_count: usize,
    incoming: VecDeque<u8>,
    closed_by_peer: bool,
    send_failures: VecDeque<Option<String>>,
    sent: Vec<Vec<u8>>,
}

impl FakeTransport {
    pub fn new() -> FakeTransport {
        Default::default()
    }

    pub fn new_connected() -> FakeTransport {
        let result = FakeTransport::new();
        result.connect_now();
        result
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn connect_now(&self) {
        let mut state = self.state();
        state.num_connects += 1;
        state.connection = Some(state.num_connects);
    }

    pub fn script_connects(&self, results: &[bool]) {
        self.state().connect_script.extend(results);
    }

    pub fn push_incoming(&self, data: &[u8]) {
        self.state().incoming.extend(data);
        self.changed.notify_waiters();
    }

    pub fn close_by_peer(&self) {
        self.state().closed_by_peer = true;
        self.changed.notify_waiters();
    }

    /// Script the outcome of upcoming sends: `None` succeeds, `Some(msg)` fails with `msg`
    pub fn script_sends(&self, outcomes: Vec<Option<&str>>) {
        self.state().send_failures.extend(outcomes.into_iter().map(|o| o.map(|s| s.to_string())));
    }

    pub fn connect_attempts(&self) -> Vec<Instant> {
        self.state().connect_attempts.clone()
    }

    pub fn readable_calls(&self) -> Vec<Instant> {
        self.state().readable_calls.clone()
    }

    pub fn reset_count(&self) -> usize {
        self.state().reset_count
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state().sent.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&self) -> anyhow::Result<()> {
        let mut state = self.state();
        state.connect_attempts.push(Instant::now());
        if state.connect_script.pop_front().unwrap_or(true) {
            drop(state);
            self.connect_now();
            Ok(())
        }
        else {
            bail!("connection refused");
        }
    }

    fn connected(&self) -> bool {
        self.state().connection.is_some()
    }

    fn connection_id(&self) -> Option<ConnectionId> {
        self.state().connection
    }

    async fn readable(&self) -> anyhow::Result<()> {
        self.state().readable_calls.push(Instant::now());
        loop {
            let notified = self.changed.notified();
            {
                let state = self.state();
                if state.connection.is_none() {
                    bail!("not connected");
                }
                if !state.incoming.is_empty() || state.closed_by_peer {
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    async fn send(&self, connection: ConnectionId, buf: &[u8]) -> IoResult {
        let mut state = self.state();
        if state.connection != Some(connection) {
            return IoResult::failed("not connected");
        }
        if let Some(Some(msg)) = state.send_failures.pop_front() {
            return IoResult::failed(msg);
        }
        state.sent.push(buf.to_vec());
        IoResult::ok(buf.len())
    }

    /// Like a stream socket, this waits until the buffer can be filled or the peer closed the
    ///  connection
    async fn recv(&self, buf: &mut [u8]) -> IoResult {
        loop {
            let notified = self.changed.notified();
            {
                let mut state = self.state();
                if state.connection.is_none() {
                    return IoResult::failed("not connected");
                }
                if state.incoming.len() >= buf.len() || state.closed_by_peer {
                    let n = buf.len().min(state.incoming.len());
                    for (i, b) in state.incoming.drain(..n).enumerate() {
                        buf[i] = b;
                    }
                    return IoResult::ok(n);
                }
            }
            notified.await;
        }
    }

    fn reset(&self) {
        let mut state = self.state();
        state.connection = None;
        state.need_reset = true;
        state.reset_count += 1;
        state.incoming.clear();
        state.closed_by_peer = false;
        drop(state);
        self.changed.notify_waiters();
    }

    fn need_connection_reset(&self) -> bool {
        self.state().need_reset
    }

    fn clear_reset(&self) {
        self.state().need_reset = false;
    }
}
