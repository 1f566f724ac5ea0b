//! Recycling of context allocations between requests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::Context;
use crate::handler::HandlersChain;
use crate::params::Params;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::values::Values;

pub const DEFAULT_MAX_IDLE: usize = 256;

/// Pool of reset contexts.
///
/// Only emptied containers are parked; request, response and handlers are
/// dropped on [`ContextPool::release`], so nothing from a finished request
/// survives into the next one.
#[derive(Debug)]
pub struct ContextPool {
    idle: Mutex<Vec<(Params, Values)>>,
    max_idle: usize,
}

impl ContextPool {
    pub fn new() -> Self {
        Self::with_max_idle(DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    /// A context armed for a new dispatch, recycled when possible.
    pub fn acquire(
        &self,
        res: Arc<dyn ResponseWriter>,
        req: Arc<Request>,
        handlers: HandlersChain,
    ) -> Context {
        let recycled = self.idle.lock().pop();
        match recycled {
            Some((params, values)) => {
                tracing::trace!("reusing pooled context");
                Context::from_parts(res, req, handlers, params, values)
            }
            None => Context::new(res, req, handlers),
        }
    }

    /// Resets `ctx` and parks its containers, unless the pool is full.
    pub fn release(&self, ctx: Context) {
        let parts = ctx.into_recycled();
        let mut idle = self.idle.lock();
        if idle.len() < self.max_idle {
            idle.push(parts);
        } else {
            tracing::debug!(max_idle = self.max_idle, "context pool full, dropping context");
        }
    }

    /// Number of parked contexts.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn max_idle(&self) -> usize {
        self.max_idle
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}
