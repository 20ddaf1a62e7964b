//! In-memory transport for tests.

mod transport;

pub use transport::{MockResponse, MockTransport, RecordedRequest};
