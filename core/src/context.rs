//! # Context - per-request execution state
//!
//! A `Context` carries the request/response pair, the handler chain for the
//! request, the route parameters and a scratch key/value store.
//!
//! ## Dispatch
//!
//! The chain is driven by a single shared cursor. [`Context::next`] advances
//! it by one and runs the handler found there. Whatever that handler does
//! decides what happens to the rest of the chain:
//!
//! - it calls `next()`: the remaining handlers run before `next()` returns,
//!   so code placed after the call observes the finished suffix ("wrap");
//! - it returns without calling `next()`: nothing after it runs and control
//!   unwinds through the enclosing `next()` calls (short-circuit);
//! - it calls [`Context::abort`]: the cursor jumps to [`ABORT_INDEX`] and no
//!   handler runs again, even if `next()` is called afterwards.
//!
//! Every `next()` resumes from the shared cursor, never from the caller's own
//! position, and the cursor never moves backwards. Calling `next()` twice from
//! one handler is therefore a caller error: the second call resumes after
//! wherever the first one stopped, running handlers a short-circuit skipped.
//! No handler ever runs twice within one dispatch.
//!
//! ```
//! use std::sync::Arc;
//! use sux_core::{Body, Context, HandlersChain, ResponseRecorder};
//!
//! let chain = HandlersChain::new()
//!     .with(|ctx: &mut Context| {
//!         ctx.set("seen", true);
//!         ctx.next();
//!     })
//!     .with(|ctx: &mut Context| {
//!         ctx.write_string("OK").unwrap();
//!     });
//!
//! let res = Arc::new(ResponseRecorder::new());
//! let req = Arc::new(http::Request::new(Body::empty()));
//! let mut ctx = Context::new(res.clone(), req, chain);
//! ctx.next();
//!
//! assert_eq!(ctx.get::<bool>("seen"), Some(&true));
//! assert_eq!(res.body(), "OK");
//! ```

use std::any::Any;
use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use http::Uri;

use crate::handler::{HandlerFunc, HandlersChain};
use crate::params::Params;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::values::Values;

/// Cursor value before the first handler.
pub const START_INDEX: isize = -1;

/// Terminal cursor value. No chain can be this long, so a context parked here
/// never runs another handler.
pub const ABORT_INDEX: isize = isize::MAX;

pub struct Context {
    req: Arc<Request>,
    res: Arc<dyn ResponseWriter>,
    index: isize,
    params: Params,
    values: Values,
    handlers: HandlersChain,
}

impl Context {
    pub fn new(res: Arc<dyn ResponseWriter>, req: Arc<Request>, handlers: HandlersChain) -> Self {
        Self::from_parts(res, req, handlers, Params::new(), Values::new())
    }

    /// Rebuilds a context around recycled containers. Both must already be empty.
    pub(crate) fn from_parts(
        res: Arc<dyn ResponseWriter>,
        req: Arc<Request>,
        handlers: HandlersChain,
        params: Params,
        values: Values,
    ) -> Self {
        debug_assert!(params.is_empty() && values.is_empty());
        Self {
            req,
            res,
            index: START_INDEX,
            params,
            values,
            handlers,
        }
    }

    /// Re-arms the context for a new request.
    ///
    /// The store is emptied and the cursor goes back before the first handler.
    /// Params are left as they are; call [`Context::reset`] first when reusing
    /// a context that served another request.
    pub fn init(&mut self, res: Arc<dyn ResponseWriter>, req: Arc<Request>, handlers: HandlersChain) {
        self.res = res;
        self.req = req;
        self.values.clear();
        self.handlers = handlers;
        self.index = START_INDEX;
    }

    /// Runs the next handler in the chain.
    ///
    /// Returns once that handler returns, which, if it called `next()` itself,
    /// is after the rest of the chain ran. A no-op past the end of the chain or
    /// after [`Context::abort`].
    pub fn next(&mut self) {
        self.index = self.index.saturating_add(1);

        let Some(handler) = self.current() else {
            return;
        };
        tracing::trace!(index = self.index, handler = handler.name(), "invoking handler");
        handler.call(self);
    }

    /// Skips every handler that has not run yet. Handlers currently on the
    /// stack still finish whatever comes after their `next()` call.
    pub fn abort(&mut self) {
        tracing::debug!(index = self.index, "chain aborted");
        self.index = ABORT_INDEX;
    }

    pub fn is_aborted(&self) -> bool {
        self.index == ABORT_INDEX
    }

    /// Cursor position: `-1` before dispatch, otherwise the index of the last
    /// handler started.
    pub fn index(&self) -> isize {
        self.index
    }

    fn current(&self) -> Option<HandlerFunc> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .cloned()
    }

    /// Adds handlers to the end of the chain.
    ///
    /// Safe mid-dispatch: they run if a later `next()` reaches their index.
    /// Once the chain has finished or was aborted they never run.
    pub fn append_handlers<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.handlers.extend(handlers);
    }

    pub fn handlers(&self) -> &HandlersChain {
        &self.handlers
    }

    /// The route's main handler, i.e. the last one in the chain.
    pub fn handler(&self) -> Option<&HandlerFunc> {
        self.handlers.last()
    }

    pub fn handler_name(&self) -> Option<&str> {
        self.handler().map(HandlerFunc::name)
    }

    /// Clears everything tied to the current request so the context can be pooled.
    pub fn reset(&mut self) {
        self.params.clear();
        self.handlers.clear();
        self.index = START_INDEX;
        self.values.clear();
    }

    /// A detached snapshot for use after dispatch returned.
    ///
    /// Shares the request and response, carries a copy of the params, starts
    /// with an empty store and an empty chain parked at [`ABORT_INDEX`]: the
    /// copy can never run a handler.
    pub fn copy(&self) -> Context {
        Context {
            req: Arc::clone(&self.req),
            res: Arc::clone(&self.res),
            index: ABORT_INDEX,
            params: self.params.clone(),
            values: Values::new(),
            handlers: HandlersChain::new(),
        }
    }

    /// Hands the (already reset) containers back to the pool.
    pub(crate) fn into_recycled(mut self) -> (Params, Values) {
        self.reset();
        (self.params, self.values)
    }

    // ---- store -------------------------------------------------------------

    pub fn set<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key, value);
    }

    /// `None` when the key was never set or holds a value of another type.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key)
    }

    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)
    }

    pub fn get_raw(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.values.get_raw(key)
    }

    /// The live store, not a copy.
    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Values {
        &mut self.values
    }

    // ---- params ------------------------------------------------------------

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    // ---- request / response ------------------------------------------------

    pub fn req(&self) -> &Arc<Request> {
        &self.req
    }

    pub fn res(&self) -> &Arc<dyn ResponseWriter> {
        &self.res
    }

    pub fn url(&self) -> &Uri {
        self.req.uri()
    }

    /// Reads the request body to its end.
    pub fn raw_data(&self) -> io::Result<Bytes> {
        self.req.body().read_to_end()
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.res.write(buf)
    }

    pub fn write_bytes(&self, buf: &[u8]) -> io::Result<usize> {
        self.res.write(buf)
    }

    pub fn write_string(&self, s: &str) -> io::Result<usize> {
        self.res.write(s.as_bytes())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.req.method())
            .field("uri", self.req.uri())
            .field("index", &self.index)
            .field("handlers", &self.handlers.len())
            .field("params", &self.params)
            .field("values", &self.values)
            .finish()
    }
}
