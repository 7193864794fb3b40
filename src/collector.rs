//! Turns one written command and the notification stream it triggers into a
//! single settled outcome.
//!
//! The device replies through notifications that carry neither a length nor
//! a request id, so the end of a reply can only be inferred:
//!
//! - in [`ResponseMode::Single`] the first notification is the reply;
//! - in [`ResponseMode::Multi`] notifications are appended until none has
//!   arrived for the whole inactivity window.
//!
//! A collector settles exactly once. The first of {first packet in single
//! mode, inactivity timeout, [`CancelHandle::cancel`]} wins, everything after
//! is ignored. The subscription is dropped on every exit path, so no
//! notification is ever delivered to a settled collector.

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio::time::{sleep, sleep_until, Duration, Instant};

use crate::error::{Error, Result, TransportError};
use crate::message::{Command, ResponseMode};
use crate::transport::{Notifications, Transport};

/// Upper bound on how late a timeout is detected
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Shorter poll intervals are raised to this
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The notifications received for one command, in delivery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Response {
    packets: Vec<Vec<u8>>,
}

impl Response {
    pub fn new(packets: Vec<Vec<u8>>) -> Self {
        Self { packets }
    }

    pub fn packets(&self) -> &[Vec<u8>] {
        &self.packets
    }

    pub fn into_packets(self) -> Vec<Vec<u8>> {
        self.packets
    }

    /// Total number of bytes received
    pub fn len(&self) -> usize {
        self.packets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All packets concatenated
    pub fn to_bytes(&self) -> Vec<u8> {
        self.packets.concat()
    }
}

/// How a collector settled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectorOutcome {
    Data(Response),
    /// The window elapsed without a complete reply. May be empty.
    TimedOut(Response),
    Canceled,
}

impl CollectorOutcome {
    /// `Data` as `Ok`, the other outcomes as [`Error::ReadTimeout`] / [`Error::Canceled`].
    pub fn into_result(self, timeout: Duration) -> Result<Response> {
        match self {
            CollectorOutcome::Data(response) => Ok(response),
            CollectorOutcome::TimedOut(partial) => Err(Error::ReadTimeout {
                timeout,
                partial: partial.to_bytes(),
            }),
            CollectorOutcome::Canceled => Err(Error::Canceled),
        }
    }
}

/// The single result slot shared by a collector and its cancel handles.
struct Settlement {
    sender: Mutex<Option<oneshot::Sender<CollectorOutcome>>>,
}

impl Settlement {
    /// Returns `false` if an outcome was already settled.
    fn settle(&self, outcome: CollectorOutcome) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        match sender {
            Some(sender) => {
                // the collector may already be gone, which still counts as settled
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }

    fn is_settled(&self) -> bool {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

/// Stops a collector from waiting any longer.
///
/// Cloneable and safe to use from another task. Canceling does not retract a
/// command already written to the device.
#[derive(Clone)]
pub struct CancelHandle(Arc<Settlement>);

impl CancelHandle {
    /// Settle the collector as [`CollectorOutcome::Canceled`] unless it already
    /// settled. Returns whether this call settled it.
    pub fn cancel(&self) -> bool {
        let canceled = self.0.settle(CollectorOutcome::Canceled);
        if canceled {
            tracing::debug!("read canceled");
        }
        canceled
    }

    pub fn is_settled(&self) -> bool {
        self.0.is_settled()
    }
}

enum Event {
    Settled(CollectorOutcome),
    Notification(Option<Result<Vec<u8>, TransportError>>),
    Tick,
}

/// Collects the reply to a single command.
pub struct ResponseCollector {
    mode: ResponseMode,
    timeout: Duration,
    poll_interval: Duration,
    settlement: Arc<Settlement>,
    outcome: oneshot::Receiver<CollectorOutcome>,
}

impl ResponseCollector {
    /// `timeout` is the overall wait in single mode and the inactivity window
    /// in multi mode.
    pub fn new(mode: ResponseMode, timeout: Duration) -> Self {
        let (sender, outcome) = oneshot::channel();
        Self {
            mode,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settlement: Arc::new(Settlement { sender: Mutex::new(Some(sender)) }),
            outcome,
        }
    }

    /// Raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.settlement.clone())
    }

    /// Subscribe, write `command` and wait for the outcome.
    ///
    /// Transport failures are returned as errors; timeouts and cancellation
    /// are outcomes. The timeout and cancellation also cover a subscribe or
    /// write that never completes.
    pub async fn run<T: Transport>(mut self, transport: &T, command: &Command) -> Result<CollectorOutcome> {
        if let Ok(outcome) = self.outcome.try_recv() {
            return Ok(outcome);
        }
        let started = Instant::now();

        let mode = self.mode;
        let setup = async {
            let notifications = transport.subscribe().await?;
            tracing::debug!(command = %hex::encode(command.as_bytes()), ?mode, "TX");
            transport.write(command.as_bytes()).await?;
            Ok::<_, Error>(notifications)
        };

        // dropping `setup` early also drops a subscription it already holds
        let mut notifications = tokio::select! {
            biased;
            settled = &mut self.outcome => return Ok(settled.unwrap_or(CollectorOutcome::Canceled)),
            _ = sleep_until(started + self.timeout) => {
                tracing::debug!("subscribe or write did not complete in time");
                return Ok(self.settle(CollectorOutcome::TimedOut(Response::default())));
            }
            setup = setup => setup?,
        };

        let outcome = self.collect(&mut notifications, started).await;
        drop(notifications);
        outcome
    }

    async fn collect(&mut self, notifications: &mut Notifications<'_>, started: Instant) -> Result<CollectorOutcome> {
        let mut packets = Vec::new();
        let mut last_alive = started;

        loop {
            let remaining = (last_alive + self.timeout).saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                let response = Response::new(packets);
                let outcome = match self.mode {
                    ResponseMode::Multi if !response.packets.is_empty() => CollectorOutcome::Data(response),
                    _ => CollectorOutcome::TimedOut(response),
                };
                return Ok(self.settle(outcome));
            }

            let event = tokio::select! {
                biased;
                settled = &mut self.outcome => Event::Settled(settled.unwrap_or(CollectorOutcome::Canceled)),
                next = notifications.next() => Event::Notification(next),
                _ = sleep(remaining.min(self.poll_interval)) => Event::Tick,
            };

            match event {
                Event::Settled(outcome) => return Ok(outcome),
                Event::Notification(Some(Ok(packet))) => {
                    tracing::debug!(packet = %hex::encode(&packet), "RX notification");
                    packets.push(packet);
                    match self.mode {
                        ResponseMode::Single => {
                            return Ok(self.settle(CollectorOutcome::Data(Response::new(packets))));
                        }
                        ResponseMode::Multi => last_alive = Instant::now(),
                    }
                }
                Event::Notification(Some(Err(err))) => {
                    tracing::warn!(%err, "notification error");
                    return Err(err.into());
                }
                Event::Notification(None) => return Err(TransportError::NotificationsClosed.into()),
                Event::Tick => {}
            }
        }
    }

    /// Offer `outcome` and return whichever outcome won.
    fn settle(&mut self, outcome: CollectorOutcome) -> CollectorOutcome {
        self.settlement.settle(outcome);
        let settled = self.outcome.try_recv().unwrap_or(CollectorOutcome::Canceled);
        match &settled {
            CollectorOutcome::Data(response) => tracing::debug!(bytes = response.len(), "response complete"),
            CollectorOutcome::TimedOut(response) => tracing::debug!(bytes = response.len(), "response timed out"),
            CollectorOutcome::Canceled => {}
        }
        settled
    }
}
