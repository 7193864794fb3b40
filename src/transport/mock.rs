//! Scripted in-memory transport for tests.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::message::Command;
use crate::transport::{Notifications, Transport};

#[derive(Default)]
pub(crate) struct MockState {
    pub connected: bool,
    pub connects: usize,
    pub disconnects: usize,
    pub writes: Vec<Vec<u8>>,
    pub subscriptions: usize,
    pub unsubscriptions: usize,
    pub active: usize,
    pub peak_active: usize,
    pub fail_writes: bool,
    /// Writes never complete
    pub hang_writes: bool,
    replies: HashMap<Vec<u8>, Vec<(Duration, Vec<u8>)>>,
    sender: Option<mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>>,
}

/// Answers each written command with its scripted packets. Each packet is
/// delivered after its delay, counted from the previous packet.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, command: &Command, packet: impl Into<Vec<u8>>) -> Self {
        self.reply_after(command, Duration::ZERO, packet)
    }

    pub fn reply_after(self, command: &Command, delay: Duration, packet: impl Into<Vec<u8>>) -> Self {
        self.state()
            .replies
            .entry(command.as_bytes().to_vec())
            .or_default()
            .push((delay, packet.into()));
        self
    }

    pub fn set_reply(&self, command: &Command, packet: impl Into<Vec<u8>>) {
        self.state()
            .replies
            .insert(command.as_bytes().to_vec(), vec![(Duration::ZERO, packet.into())]);
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Push a packet into the active subscription, if any.
    pub fn notify(&self, packet: impl Into<Vec<u8>>) -> bool {
        self.push(Ok(packet.into()))
    }

    /// Deliver an error through the active subscription, if any.
    pub fn notify_error(&self, err: TransportError) -> bool {
        self.push(Err(err))
    }

    /// End the active notification stream as if the device went away.
    pub fn close_notifications(&self) {
        self.state().sender = None;
    }

    fn push(&self, item: Result<Vec<u8>, TransportError>) -> bool {
        match &self.state().sender {
            Some(sender) => sender.send(item).is_ok(),
            None => false,
        }
    }
}

struct Subscription {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, TransportError>>,
    state: Arc<Mutex<MockState>>,
}

impl Stream for Subscription {
    type Item = Result<Vec<u8>, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.unsubscriptions += 1;
        state.active -= 1;
        state.sender = None;
    }
}

impl Transport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        state.connects += 1;
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        state.disconnects += 1;
        state.connected = false;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state().connected
    }

    async fn subscribe(&self) -> Result<Notifications<'_>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        state.subscriptions += 1;
        state.active += 1;
        state.peak_active = state.peak_active.max(state.active);
        state.sender = Some(tx);
        Ok(Subscription { rx, state: self.state.clone() }.boxed())
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let hang = {
            let mut state = self.state();
            state.writes.push(data.to_vec());
            state.hang_writes
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let state = self.state();
        if state.fail_writes {
            return Err(TransportError::NotConnected);
        }
        let sender = state.sender.clone().ok_or(TransportError::NotSubscribed)?;
        let script = state.replies.get(data).cloned().unwrap_or_default();
        drop(state);

        let mut delayed = Vec::new();
        for (delay, packet) in script {
            if delay.is_zero() && delayed.is_empty() {
                let _ = sender.send(Ok(packet));
            } else {
                delayed.push((delay, packet));
            }
        }
        if !delayed.is_empty() {
            tokio::spawn(async move {
                for (delay, packet) in delayed {
                    tokio::time::sleep(delay).await;
                    let _ = sender.send(Ok(packet));
                }
            });
        }
        Ok(())
    }
}
