//! Response sink.
//!
//! Handlers write through a shared [`ResponseWriter`]; the transport decides
//! what a write means. [`ResponseRecorder`] buffers everything in memory and
//! hands back an `http::Response` once the chain is done.

use std::io;

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use parking_lot::Mutex;

/// Outbound response sink, shared by a context and its copies.
pub trait ResponseWriter: Send + Sync {
    /// Sets a header. Has no effect once the status line went out.
    fn set_header(&self, name: HeaderName, value: HeaderValue);

    /// Sends the status. Only the first call counts.
    fn write_header(&self, status: StatusCode);

    /// Writes body bytes, sending `200 OK` first if no status was written.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// The status written so far, if any.
    fn status(&self) -> Option<StatusCode>;
}

#[derive(Debug, Default)]
struct Recorded {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
}

/// In-memory [`ResponseWriter`].
#[derive(Debug, Default)]
pub struct ResponseRecorder {
    inner: Mutex<Recorded>,
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> HeaderMap {
        self.inner.lock().headers.clone()
    }

    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner.lock().body)
    }

    /// Moves the recorded response out, leaving the recorder empty.
    /// Nothing written means an empty `200 OK`.
    pub fn take_response(&self) -> Response<Bytes> {
        let recorded = std::mem::take(&mut *self.inner.lock());
        let mut res = Response::new(recorded.body.freeze());
        *res.status_mut() = recorded.status.unwrap_or(StatusCode::OK);
        *res.headers_mut() = recorded.headers;
        res
    }
}

impl ResponseWriter for ResponseRecorder {
    fn set_header(&self, name: HeaderName, value: HeaderValue) {
        let mut inner = self.inner.lock();
        if inner.status.is_some() {
            tracing::warn!(header = %name, "header set after status was written; ignored");
            return;
        }
        inner.headers.insert(name, value);
    }

    fn write_header(&self, status: StatusCode) {
        let mut inner = self.inner.lock();
        match inner.status {
            Some(current) => {
                tracing::warn!(%current, ignored = %status, "superfluous write_header call");
            }
            None => inner.status = Some(status),
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.status.get_or_insert(StatusCode::OK);
        inner.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn status(&self) -> Option<StatusCode> {
        self.inner.lock().status
    }
}
