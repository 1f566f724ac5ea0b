//! # sux-http
//!
//! Runs a [`sux_core::HandlersChain`] as a `tower::Service` over `http`
//! requests. The service buffers the request body, dispatches the chain on a
//! pooled [`sux_core::Context`] and turns whatever the handlers wrote into an
//! `http::Response<Full<Bytes>>`.
//!
//! Binding a listener is left to the caller, e.g. through
//! `hyper_util::service::TowerToHyperService`.

pub mod error;
pub mod service;

pub use error::{BoxError, ChainError};
pub use service::{ChainService, ParamsFn};

pub mod prelude {
    pub use crate::error::ChainError;
    pub use crate::service::ChainService;
    pub use sux_core::prelude::*;

    pub use bytes::Bytes;
    pub use http::{Method, StatusCode};
    pub use http_body_util::Full;
}
