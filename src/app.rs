//! The request pipeline: dispatch, invoke, emit.

use std::collections::HashMap;

use http::StatusCode;
use tracing::debug;

use crate::emit::{OutputEnvironment, ResponseEmitter};
use crate::error::{Error, Result};
use crate::handler::{BoxedHandler, Handler, HandlerInvoker};
use crate::request::Request;
use crate::response::Response;
use crate::router::{Controller, DispatchResult, Dispatcher, RequestDispatcher, RouteTable};

/// An application: a matcher, the named controllers its routes may refer
/// to, and the emitter that writes responses out.
///
/// ```rust,no_run
/// use spout::{App, Params, Request, RouteGroupComposer, RouteTable};
///
/// async fn hello(_: Request, _: Params) -> &'static str { "hello" }
///
/// let mut routes = RouteGroupComposer::new(RouteTable::new());
/// routes.get("/", hello)?;
/// let app = App::new(routes.into_collector());
/// # Ok::<(), spout::Error>(())
/// ```
pub struct App<D = RouteTable> {
    dispatcher: RequestDispatcher<D>,
    controllers: HashMap<String, BoxedHandler>,
    emitter: ResponseEmitter,
}

impl<D: Dispatcher> App<D> {
    pub fn new(matcher: D) -> Self {
        Self {
            dispatcher: RequestDispatcher::new(matcher),
            controllers: HashMap::new(),
            emitter: ResponseEmitter::default(),
        }
    }

    pub fn with_emitter(mut self, emitter: ResponseEmitter) -> Self {
        self.emitter = emitter;
        self
    }

    /// Registers the handler behind a [`Controller::Named`] route target.
    pub fn controller(mut self, name: &str, handler: impl Handler) -> Self {
        self.controllers.insert(name.to_owned(), handler.into_boxed_handler());
        self
    }

    pub fn emitter(&self) -> &ResponseEmitter {
        &self.emitter
    }

    /// Matches `req` and runs its handler.
    ///
    /// No match yields `404`; a path that exists under other methods yields
    /// `405` with an `Allow` header. Handler and matcher errors are returned.
    pub async fn respond(&self, req: &Request) -> Result<Response> {
        match self.dispatcher.dispatch(req)? {
            DispatchResult::Matched { controller, args, .. } => {
                let handler = self.resolve(controller)?;
                HandlerInvoker::new(handler, args).handle(req.clone()).await
            }
            DispatchResult::NotFound => Ok(Response::status(StatusCode::NOT_FOUND)),
            DispatchResult::MethodNotAllowed { allowed } => {
                let allow = allowed.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
                Ok(Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header("Allow", &allow)
                    .no_body())
            }
        }
    }

    /// Runs [`respond`](App::respond) and emits the result into `env`.
    pub async fn handle<E>(&self, req: &Request, env: &mut E) -> Result<()>
    where
        E: OutputEnvironment + Send + ?Sized,
    {
        let mut res = self.respond(req).await?;
        debug!(status = res.status_code().as_u16(), "emitting response");
        self.emitter.process(env, req, &mut res)
    }

    fn resolve(&self, controller: Controller) -> Result<BoxedHandler> {
        match controller {
            Controller::Handler(handler) => Ok(handler),
            Controller::Named(name) => self.controllers.get(&name)
                .cloned()
                .ok_or(Error::UnresolvedController(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::OutputStack;
    use crate::request::Params;
    use crate::router::{RouteData, RouteGroupComposer};

    async fn show(_: Request, args: Params) -> String {
        format!("user {}", args.get("id").unwrap_or("?"))
    }

    fn app() -> App {
        let mut routes = RouteGroupComposer::new(RouteTable::new());
        routes.get("/users/{id}", show).unwrap();
        routes
            .add_route(["GET"], "/named", Controller::named("greeter"), RouteData::new())
            .unwrap();
        routes
            .add_route(["GET"], "/ghost", Controller::named("missing"), RouteData::new())
            .unwrap();
        App::new(routes.into_collector())
            .controller("greeter", |_: Request, _: Params| async { "hi" })
    }

    #[tokio::test]
    async fn matched_route_runs_its_handler() {
        let mut out = OutputStack::new(Vec::new());
        app().handle(&Request::new("GET", "/users/9"), &mut out).await.unwrap();
        assert_eq!(out.status_line(), Some("HTTP/1.1 200 OK"));
        assert_eq!(out.sink(), b"user 9");
    }

    #[tokio::test]
    async fn named_controllers_resolve_through_the_app() {
        let mut res = app().respond(&Request::new("GET", "/named")).await.unwrap();
        assert_eq!(res.body_mut().read(16).unwrap(), "hi");

        let err = app().respond(&Request::new("GET", "/ghost")).await.unwrap_err();
        assert!(matches!(err, Error::UnresolvedController(name) if name == "missing"));
    }

    #[tokio::test]
    async fn unmatched_requests_get_404_and_405() {
        let res = app().respond(&Request::new("GET", "/nowhere")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

        let res = app().respond(&Request::new("POST", "/users/1")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers().get("allow"), Some("GET, HEAD"));
    }
}
