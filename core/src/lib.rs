//! # sux-core
//!
//! Per-request execution context for a middleware chain: the request/response
//! pair, the ordered handlers, a cursor-driven [`Context::next`], route
//! params and a request-scoped store. Routing and serving live elsewhere.

pub mod context;
pub mod handler;
pub mod params;
pub mod pool;
pub mod request;
pub mod response;
pub mod values;

pub use context::{ABORT_INDEX, Context, START_INDEX};
pub use handler::{HandlerFunc, HandlersChain};
pub use params::{Param, Params};
pub use pool::ContextPool;
pub use request::{Body, Request};
pub use response::{ResponseRecorder, ResponseWriter};
pub use values::Values;

pub mod prelude {
    pub use crate::context::Context;
    pub use crate::handler::{HandlerFunc, HandlersChain};
    pub use crate::params::Params;
    pub use crate::pool::ContextPool;
    pub use crate::request::{Body, Request};
    pub use crate::response::{ResponseRecorder, ResponseWriter};
}
