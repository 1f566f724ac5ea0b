//! Handler functions and the ordered chain they are dispatched from.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;

type HandlerFn = dyn Fn(&mut Context) + Send + Sync + 'static;

/// A single unit of request processing.
///
/// Handlers receive the [`Context`] and return nothing: continuation is
/// expressed by calling (or not calling) [`Context::next`]. Cloning is cheap,
/// the underlying closure is reference counted so the same chain can be
/// shared by every request hitting a route.
#[derive(Clone)]
pub struct HandlerFunc {
    name: Cow<'static, str>,
    func: Arc<HandlerFn>,
}

impl HandlerFunc {
    /// Wraps a closure or function, naming it after its Rust type.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(std::any::type_name::<F>()),
            func: Arc::new(func),
        }
    }

    /// Wraps a closure under an explicit name (used in logs and `handler_name`).
    pub fn named<F>(name: impl Into<Cow<'static, str>>, func: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, ctx: &mut Context) {
        (self.func)(ctx)
    }

    /// Returns true if both values wrap the same closure allocation.
    pub fn ptr_eq(&self, other: &HandlerFunc) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for HandlerFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HandlerFunc").field(&self.name).finish()
    }
}

/// Ordered handlers for one dispatch.
#[derive(Clone, Debug, Default)]
pub struct HandlersChain {
    handlers: Vec<HandlerFunc>,
}

impl HandlersChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style push, handy when assembling a route's chain.
    pub fn with<F>(mut self, func: F) -> Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handlers.push(HandlerFunc::new(func));
        self
    }

    pub fn push(&mut self, handler: HandlerFunc) {
        self.handlers.push(handler);
    }

    pub fn get(&self, index: usize) -> Option<&HandlerFunc> {
        self.handlers.get(index)
    }

    /// The last handler is the route's main handler; everything before it is middleware.
    pub fn last(&self) -> Option<&HandlerFunc> {
        self.handlers.last()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HandlerFunc> {
        self.handlers.iter()
    }
}

impl Extend<HandlerFunc> for HandlersChain {
    fn extend<I: IntoIterator<Item = HandlerFunc>>(&mut self, iter: I) {
        self.handlers.extend(iter);
    }
}

impl FromIterator<HandlerFunc> for HandlersChain {
    fn from_iter<I: IntoIterator<Item = HandlerFunc>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<HandlerFunc>> for HandlersChain {
    fn from(handlers: Vec<HandlerFunc>) -> Self {
        Self { handlers }
    }
}

impl<'a> IntoIterator for &'a HandlersChain {
    type Item = &'a HandlerFunc;
    type IntoIter = std::slice::Iter<'a, HandlerFunc>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}
