//! Detection listener.
//!
//! Runs the tag reader in its own task and forwards every detection into a
//! bounded channel. The consumer drains the channel one event at a time;
//! detections that arrive while it is busy wait in the channel, and the
//! reader task is held back once the channel is full.
//!
//! ```text
//! ┌──────────┐      ┌──────────────────┐
//! │ Reader   │─────►│ Event Channel    │─────► Event Orchestrator
//! │ Task     │      │ (mpsc, bounded)  │
//! └──────────┘      └──────────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use tagwatch_hardware::devices::AnyTagReader;
//! use tagwatch_hardware::listener::{DetectionListener, ListenerEvent};
//! use tagwatch_hardware::mock::MockTagReader;
//!
//! #[tokio::main]
//! async fn main() -> tagwatch_hardware::Result<()> {
//!     let (reader, _handle) = MockTagReader::new();
//!     let mut handle = DetectionListener::new(AnyTagReader::Mock(reader)).start();
//!
//!     while let Some(event) = handle.recv().await {
//!         if let ListenerEvent::Detection(detection) = event {
//!             println!("Tag {} is {}", detection.uid, detection.state);
//!         }
//!     }
//!
//!     handle.shutdown().await?;
//!     Ok(())
//! }
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::devices::AnyTagReader;
use crate::traits::{DetectionEvent, TagReader};
use crate::Result;

/// Default capacity of the detection channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Event delivered by the listener.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ListenerEvent {
    /// The reader reported a tag state change.
    Detection(DetectionEvent),

    /// The reader failed and its task has stopped.
    ReaderError {
        /// Error message.
        error: String,
    },
}

/// Spawns the reader task.
pub struct DetectionListener {
    reader: AnyTagReader,
    capacity: usize,
}

impl DetectionListener {
    /// Listener with the default channel capacity.
    pub fn new(reader: AnyTagReader) -> Self {
        Self {
            reader,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Set the channel capacity (at least 1).
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Start reading and return the receiving handle.
    pub fn start(self) -> ListenerHandle {
        let (event_tx, event_rx) = mpsc::channel(self.capacity);
        let mut tasks = JoinSet::new();

        info!("Starting tag reader: {}", self.reader.info().name);
        tasks.spawn(reader_task(self.reader, event_tx));

        ListenerHandle { event_rx, tasks }
    }
}

/// Receiving side of a started [`DetectionListener`].
pub struct ListenerHandle {
    event_rx: mpsc::Receiver<ListenerEvent>,
    tasks: JoinSet<Result<()>>,
}

impl ListenerHandle {
    /// Receive the next event.
    ///
    /// Returns `None` once the reader task has stopped and every buffered
    /// event has been received.
    pub async fn recv(&mut self) -> Option<ListenerEvent> {
        self.event_rx.recv().await
    }

    /// Stop the reader task and wait for it to finish.
    ///
    /// Task errors and panics are logged, not returned.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tasks.abort_all();

        while let Some(result) = self.tasks.join_next().await {
            match result {
                Ok(Ok(())) => debug!("Reader task finished"),
                Ok(Err(e)) => warn!("Reader task ended with error: {}", e),
                Err(e) if e.is_cancelled() => debug!("Reader task cancelled"),
                Err(e) => error!("Reader task panicked: {}", e),
            }
        }
        Ok(())
    }
}

async fn reader_task(mut reader: AnyTagReader, tx: mpsc::Sender<ListenerEvent>) -> Result<()> {
    loop {
        match reader.next_detection().await {
            Ok(detection) => {
                let event = match tx.try_send(ListenerEvent::Detection(detection)) {
                    Ok(()) => continue,
                    Err(mpsc::error::TrySendError::Full(event)) => event,
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                };
                // Consumer is busy; hold the reader until there is room.
                warn!("Detection channel full, reader waiting");
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) if e.is_fatal() => {
                error!("Tag reader stopped: {}", e);
                let _ = tx
                    .send(ListenerEvent::ReaderError {
                        error: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
            Err(e) => warn!("Discarding reader input: {}", e),
        }
    }
    debug!("Detection channel closed, reader task exiting");
    Ok(())
}
