//! Line-driven tag reader.
//!
//! Reads one UID per line from any async buffered source (stdin in the
//! `tagwatch` binary), so the terminal can run without an RC522 attached.
//! Each line is hex with optional separators (`99 B6 B3 02`, `250FC501`)
//! and produces an `Active` detection. Blank lines and `#` comments are
//! skipped; malformed lines are reported as `InvalidData` and reading can
//! continue.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

use tagwatch_core::CredentialId;

use crate::{
    HardwareError, Result,
    traits::{DetectionEvent, TagReader},
    types::DeviceInfo,
};

type BoxedSource = Box<dyn AsyncBufRead + Unpin + Send>;

/// Tag reader fed by text lines.
pub struct LineTagReader {
    lines: Lines<BoxedSource>,
    name: String,
    line_no: usize,
}

impl LineTagReader {
    /// Read from an arbitrary buffered source.
    pub fn new(source: impl AsyncBufRead + Unpin + Send + 'static, name: impl Into<String>) -> Self {
        let source: BoxedSource = Box::new(source);
        Self {
            lines: source.lines(),
            name: name.into(),
            line_no: 0,
        }
    }

    /// Read from the process's standard input.
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()), "stdin")
    }
}

impl std::fmt::Debug for LineTagReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineTagReader")
            .field("name", &self.name)
            .field("line_no", &self.line_no)
            .finish_non_exhaustive()
    }
}

impl TagReader for LineTagReader {
    async fn next_detection(&mut self) -> Result<DetectionEvent> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Err(HardwareError::disconnected(format!(
                    "{} reached end of input",
                    self.name
                )));
            };
            self.line_no += 1;

            let text = line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let uid = CredentialId::parse_hex(text).map_err(|e| {
                HardwareError::invalid_data(format!("{} line {}: {e}", self.name, self.line_no))
            })?;
            debug!("Line {} of {} presented UID {}", self.line_no, self.name, uid);
            return Ok(DetectionEvent::active(uid));
        }
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo::new(format!("Line reader ({})", self.name), "Text input")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::TagState;

    fn reader(input: &'static str) -> LineTagReader {
        LineTagReader::new(input.as_bytes(), "test")
    }

    #[tokio::test]
    async fn test_reads_one_event_per_line() {
        let mut reader = reader("99 B6 B3 02\n250FC501\n");

        let first = reader.next_detection().await.unwrap();
        assert_eq!(first.uid.to_text(), "99 B6 B3 02");
        assert_eq!(first.state, TagState::Active);

        let second = reader.next_detection().await.unwrap();
        assert_eq!(second.uid.to_text(), "25 0F C5 01");
    }

    #[tokio::test]
    async fn test_skips_blank_and_comment_lines() {
        let mut reader = reader("\n   \n# gate test\n01:02:03:04\n");
        let event = reader.next_detection().await.unwrap();
        assert_eq!(event.uid.as_bytes(), &[1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_not_fatal() {
        let mut reader = reader("hello\n0A0B0C0D\n");

        let err = reader.next_detection().await.unwrap_err();
        assert!(matches!(err, HardwareError::InvalidData { .. }));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("line 1"));

        let event = reader.next_detection().await.unwrap();
        assert_eq!(event.uid.as_bytes(), &[0x0A, 0x0B, 0x0C, 0x0D]);
    }

    #[tokio::test]
    async fn test_end_of_input_disconnects() {
        let mut reader = reader("");
        let err = reader.next_detection().await.unwrap_err();
        assert!(err.is_fatal());
    }
}
