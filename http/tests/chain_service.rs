use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Request, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, Full};
use sux_core::{Context, ContextPool, HandlerFunc, HandlersChain, Params};
use sux_http::{ChainError, ChainService};
use tower::ServiceExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn logger(ctx: &mut Context) {
    let start = Instant::now();
    ctx.next();
    ctx.res().set_header(
        http::HeaderName::from_static("x-elapsed-us"),
        HeaderValue::from(start.elapsed().as_micros() as u64),
    );
    ctx.set("logged", true);
}

fn auth(ctx: &mut Context) {
    if !ctx.req().headers().contains_key(AUTHORIZATION) {
        ctx.res().write_header(StatusCode::UNAUTHORIZED);
        return;
    }
    ctx.next();
}

fn ok(ctx: &mut Context) {
    ctx.res()
        .set_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    let _ = ctx.write_string("OK");
}

fn app() -> ChainService {
    ChainService::new(HandlersChain::new().with(logger).with(auth).with(ok))
}

async fn body_of(res: http::Response<Full<Bytes>>) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn test_request_without_auth_is_short_circuited() {
    init_tracing();
    let req = Request::get("/").body(Full::new(Bytes::new())).unwrap();

    let res = app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(CONTENT_TYPE).is_none());
    assert!(body_of(res).await.is_empty());
}

#[tokio::test]
async fn test_request_with_auth_reaches_handler() {
    init_tracing();
    let req = Request::get("/")
        .header(AUTHORIZATION, "Bearer token")
        .body(Full::new(Bytes::new()))
        .unwrap();

    let res = app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "text/plain");
    // set after the body went out, so the logger's header is dropped
    assert!(res.headers().get("x-elapsed-us").is_none());
    assert_eq!(body_of(res).await, "OK");
}

#[tokio::test]
async fn test_body_and_params_reach_handlers() {
    init_tracing();
    let echo = HandlersChain::new().with(|ctx: &mut Context| {
        let id = ctx.param("id").unwrap_or("none").to_string();
        let body = ctx.raw_data().unwrap_or_default();
        let _ = ctx.write_string(&format!("{id}:"));
        let _ = ctx.write_bytes(&body);
    });
    let svc = ChainService::new(echo).with_params_fn(|parts| {
        let mut params = Params::new();
        if let Some(id) = parts.uri.path().strip_prefix("/users/") {
            params.push("id", id);
        }
        params
    });

    let req = Request::post("/users/42")
        .body(Full::new(Bytes::from_static(b"hello")))
        .unwrap();
    let res = svc.oneshot(req).await.unwrap();

    assert_eq!(body_of(res).await, "42:hello");
}

#[tokio::test]
async fn test_contexts_are_returned_to_pool() {
    init_tracing();
    let pool = Arc::new(ContextPool::with_max_idle(4));
    let svc = app().with_pool(pool.clone());

    for _ in 0..3 {
        let req = Request::get("/").body(Full::new(Bytes::new())).unwrap();
        svc.clone().oneshot(req).await.unwrap();
    }

    // sequential requests keep reusing the same parked context
    assert_eq!(pool.idle(), 1);
}

#[tokio::test]
async fn test_abort_stops_chain() {
    init_tracing();
    let chain: HandlersChain = vec![
        HandlerFunc::named("guard", |ctx: &mut Context| {
            ctx.res().write_header(StatusCode::FORBIDDEN);
            ctx.abort();
            ctx.next();
        }),
        HandlerFunc::named("main", |ctx: &mut Context| {
            let _ = ctx.write_string("unreachable");
        }),
    ]
    .into();

    let req = Request::get("/").body(Full::new(Bytes::new())).unwrap();
    let res = ChainService::new(chain).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(body_of(res).await.is_empty());
}

/// Body whose first frame fails, like a connection reset mid-upload.
struct FailingBody;

impl http_body::Body for FailingBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
    }
}

#[tokio::test]
async fn test_body_error_is_reported() {
    init_tracing();
    let req = Request::post("/").body(FailingBody).unwrap();

    let err = app().oneshot(req).await.unwrap_err();

    assert!(matches!(err, ChainError::Body(_)));
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn test_empty_chain_returns_empty_ok() {
    init_tracing();
    let req = Request::get("/").body(Full::new(Bytes::new())).unwrap();
    let res = ChainService::new(HandlersChain::new())
        .oneshot(req)
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_of(res).await.is_empty());
}
