use std::fmt;
use std::io::{self, Cursor, Read};

use bytes::Bytes;
use parking_lot::Mutex;

/// The inbound request as seen by handlers.
///
/// Shared behind an `Arc` between the context, its copies and the router, so
/// the body stream sits behind a lock.
pub type Request = http::Request<Body>;

/// Request body stream.
pub struct Body {
    reader: Mutex<Box<dyn Read + Send>>,
}

impl Body {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Mutex::new(Box::new(reader)),
        }
    }

    pub fn empty() -> Self {
        Self::new(io::empty())
    }

    /// Reads whatever is left of the stream. A second call returns the empty tail.
    pub fn read_to_end(&self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        self.reader.lock().read_to_end(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::new(Cursor::new(s.as_bytes()))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}
