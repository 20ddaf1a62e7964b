//! Mock tag reader.

use tagwatch_core::CredentialId;
use tokio::sync::mpsc;

use crate::{
    HardwareError, Result,
    traits::{DetectionEvent, TagReader, TagState},
    types::DeviceInfo,
};

/// Event buffer between the handle and the reader.
const EVENT_BUFFER: usize = 32;

/// Mock tag reader for testing and development.
///
/// Detection events are injected through the paired [`MockTagReaderHandle`].
/// Dropping every handle disconnects the reader.
///
/// # Examples
///
/// ```
/// use tagwatch_core::CredentialId;
/// use tagwatch_hardware::mock::MockTagReader;
/// use tagwatch_hardware::traits::{TagReader, TagState};
///
/// #[tokio::main]
/// async fn main() -> tagwatch_hardware::Result<()> {
///     let (mut reader, handle) = MockTagReader::new();
///
///     let uid: CredentialId = "99 B6 B3 02".parse().unwrap();
///     handle.present(uid.clone()).await?;
///
///     let event = reader.next_detection().await?;
///     assert_eq!(event.uid, uid);
///     assert_eq!(event.state, TagState::Active);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    event_rx: mpsc::Receiver<DetectionEvent>,
    name: String,
}

impl MockTagReader {
    /// Create a mock reader with the default name.
    pub fn new() -> (Self, MockTagReaderHandle) {
        Self::with_name("Mock Tag Reader")
    }

    /// Create a mock reader with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTagReaderHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let reader = Self {
            event_rx,
            name: name.into(),
        };
        (reader, MockTagReaderHandle { event_tx })
    }
}

impl TagReader for MockTagReader {
    async fn next_detection(&mut self) -> Result<DetectionEvent> {
        self.event_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(self.name.clone()))
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(self.name.clone(), "Mock")
    }
}

/// Handle for injecting events into a [`MockTagReader`].
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    event_tx: mpsc::Sender<DetectionEvent>,
}

impl MockTagReaderHandle {
    /// Present a tag: emits an `Active` event for `uid`.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader was dropped.
    pub async fn present(&self, uid: CredentialId) -> Result<()> {
        self.send(DetectionEvent::active(uid)).await
    }

    /// Emit a state change other than activation.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader was dropped.
    pub async fn transition(&self, uid: CredentialId, state: TagState) -> Result<()> {
        self.send(DetectionEvent::new(uid, state)).await
    }

    /// Emit a fully specified event.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::Disconnected` if the reader was dropped.
    pub async fn send(&self, event: DetectionEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| HardwareError::disconnected("Mock tag reader dropped"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(bytes: &[u8]) -> CredentialId {
        CredentialId::new(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_present_and_read() {
        let (mut reader, handle) = MockTagReader::new();

        tokio::spawn(async move {
            handle.present(uid(&[0x25, 0x0F, 0xC5, 0x01])).await.unwrap();
        });

        let event = reader.next_detection().await.unwrap();
        assert_eq!(event.uid.to_text(), "25 0F C5 01");
        assert!(event.state.is_active());
    }

    #[tokio::test]
    async fn test_events_keep_order() {
        let (mut reader, handle) = MockTagReader::new();

        handle.transition(uid(&[1, 2, 3, 4]), TagState::Ready).await.unwrap();
        handle.present(uid(&[1, 2, 3, 4])).await.unwrap();
        handle.transition(uid(&[1, 2, 3, 4]), TagState::Halt).await.unwrap();

        let states: Vec<TagState> = [
            reader.next_detection().await.unwrap().state,
            reader.next_detection().await.unwrap().state,
            reader.next_detection().await.unwrap().state,
        ]
        .into();
        assert_eq!(states, vec![TagState::Ready, TagState::Active, TagState::Halt]);
    }

    #[tokio::test]
    async fn test_dropped_handle_disconnects() {
        let (mut reader, handle) = MockTagReader::with_name("Gate Reader");
        drop(handle);

        let err = reader.next_detection().await.unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Device disconnected: Gate Reader");
    }

    #[tokio::test]
    async fn test_dropped_reader_fails_send() {
        let (reader, handle) = MockTagReader::new();
        drop(reader);

        assert!(handle.present(uid(&[1, 2, 3, 4])).await.is_err());
    }

    #[test]
    fn test_info() {
        let (reader, _handle) = MockTagReader::new();
        assert_eq!(reader.info().name, "Mock Tag Reader");
    }
}
