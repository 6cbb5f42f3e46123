//! Handler trait, type erasure, and single-shot invocation.
//!
//! # How async handlers are stored
//!
//! A route table holds handlers of *different* types side by side, so each
//! one is hidden behind a trait object (`dyn ErasedHandler`) and shared as an
//! `Arc`. The chain from user code to vtable call is:
//!
//! ```text
//! async fn show(req: Request, args: Params) -> Response { … }   ← user writes this
//!        ↓ composer.on("GET", "/users/{id}", show)
//! show.into_boxed_handler()                     ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                     ← stored as BoxedHandler
//!        ↓ dispatch → HandlerInvoker::new(handler, args)
//! invoker.handle(req)                           ← one vtable call, exactly once
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;
use tracing::debug;

use crate::error::{BoxError, Error, Result};
use crate::request::{Params, Request};
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a handler outcome.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, args: Params) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Handler outputs ───────────────────────────────────────────────────────────

/// Values a handler may resolve to.
///
/// Anything that is [`IntoResponse`] succeeds; a `Result` whose error converts
/// into [`BoxError`] fails with [`Error::Handler`], carrying the handler's
/// error untouched as its source.
pub trait HandlerOutput {
    fn into_outcome(self) -> Result<Response>;
}

macro_rules! infallible_output {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HandlerOutput for $ty {
                fn into_outcome(self) -> Result<Response> {
                    Ok(self.into_response())
                }
            }
        )*
    };
}

infallible_output!(Response, String, &'static str, StatusCode);

impl<T, E> HandlerOutput for std::result::Result<T, E>
where
    T: IntoResponse,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<Response> {
        self.map(IntoResponse::into_response)
            .map_err(|e| Error::Handler(e.into()))
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(req: Request, args: Params) -> impl HandlerOutput
/// ```
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request, Params) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype wrapper that holds a concrete handler `F` and implements
/// [`ErasedHandler`], bridging the typed world to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Params) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: HandlerOutput + Send + 'static,
{
    fn call(&self, req: Request, args: Params) -> BoxFuture {
        let fut = (self.0)(req, args);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── HandlerInvoker ────────────────────────────────────────────────────────────

/// One resolved handler bound to the path arguments of one match.
///
/// [`handle`](HandlerInvoker::handle) consumes the invoker, so the handler
/// runs at most once per match. Errors are returned as the handler produced
/// them; the invoker does not translate them into responses.
pub struct HandlerInvoker {
    handler: BoxedHandler,
    args: Params,
}

impl HandlerInvoker {
    pub fn new(handler: BoxedHandler, args: Params) -> Self {
        Self { handler, args }
    }

    pub fn args(&self) -> &Params {
        &self.args
    }

    pub async fn handle(self, req: Request) -> Result<Response> {
        debug!(method = req.method(), uri = req.uri(), args = self.args.len(), "invoking handler");
        self.handler.call(req, self.args).await
    }
}

impl std::fmt::Debug for HandlerInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerInvoker").field("args", &self.args).finish_non_exhaustive()
    }
}
