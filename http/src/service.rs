//! # ChainService - Tower Service Adapter
//!
//! Adapts a handler chain to Tower's `Service` trait so it can sit behind any
//! Tower-compatible server or middleware stack.

use bytes::Bytes;
use http::request::Parts;
use http::{Request, Response};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Full};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use sux_core::{Body, ContextPool, HandlersChain, Params, ResponseRecorder};
use tower::Service;
use tracing::Instrument;

use crate::error::{BoxError, ChainError};

/// Extracts route params from the request head before dispatch.
pub type ParamsFn = Arc<dyn Fn(&Parts) -> Params + Send + Sync>;

/// Dispatches every request through the same handler chain.
#[derive(Clone)]
pub struct ChainService {
    chain: HandlersChain,
    pool: Arc<ContextPool>,
    params_fn: Option<ParamsFn>,
}

impl ChainService {
    pub fn new(chain: HandlersChain) -> Self {
        Self {
            chain,
            pool: Arc::new(ContextPool::new()),
            params_fn: None,
        }
    }

    /// Share a context pool, e.g. between the services of several routes.
    pub fn with_pool(mut self, pool: Arc<ContextPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Set how route params are pulled out of a request.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sux_core::{HandlersChain, Params};
    /// use sux_http::ChainService;
    ///
    /// let svc = ChainService::new(HandlersChain::new()).with_params_fn(|parts| {
    ///     let mut params = Params::new();
    ///     if let Some(id) = parts.uri.path().strip_prefix("/users/") {
    ///         params.push("id", id);
    ///     }
    ///     params
    /// });
    /// # drop(svc);
    /// ```
    pub fn with_params_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Parts) -> Params + Send + Sync + 'static,
    {
        self.params_fn = Some(Arc::new(f));
        self
    }

    pub fn chain(&self) -> &HandlersChain {
        &self.chain
    }

    pub fn pool(&self) -> &Arc<ContextPool> {
        &self.pool
    }
}

impl<B> Service<Request<B>> for ChainService
where
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = Response<Full<Bytes>>;
    type Error = ChainError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let chain = self.chain.clone();
        let pool = self.pool.clone();
        let params_fn = self.params_fn.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let request_id = uuid::Uuid::new_v4().to_string();
            let method = parts.method.clone();
            let path = parts.uri.path().to_string();
            let span = tracing::info_span!(
                "HTTPRequest",
                sux.http.method = %method,
                sux.http.path = %path,
                sux.http.request_id = %request_id
            );

            async move {
                let bytes = match body.collect().await {
                    Ok(collected) => collected.to_bytes(),
                    Err(e) => {
                        let err = ChainError::Body(e.into());
                        tracing::error!(error = %err, "request body unavailable");
                        return Err(err);
                    }
                };

                let params = params_fn.map(|f| f(&parts)).unwrap_or_default();
                let req = Arc::new(Request::from_parts(parts, Body::from(bytes)));
                let recorder = Arc::new(ResponseRecorder::new());

                let mut ctx = pool.acquire(recorder.clone(), req, chain);
                ctx.set_params(params);
                ctx.next();
                let aborted = ctx.is_aborted();
                pool.release(ctx);

                let res = recorder.take_response();
                tracing::debug!(status = %res.status(), aborted, "chain finished");
                Ok(res.map(Full::new))
            }
            .instrument(span)
            .await
        })
    }
}
