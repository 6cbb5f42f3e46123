//! # spout
//!
//! The tail end of an HTTP request: compose routes in nested groups, invoke
//! the matched handler, and emit the response through whatever buffering
//! sits between the application and the client.
//!
//! ## The pieces
//!
//! - [`RouteGroupComposer`]: registers routes under nested prefixes with
//!   inherited, deep-merged data, and hands them to a [`RouteCollector`].
//! - [`RequestDispatcher`]: asks a [`Dispatcher`] to match a request.
//! - [`HandlerInvoker`]: runs one matched handler with its path arguments.
//! - [`ResponseEmitter`]: sends headers, streams the body in bounded chunks,
//!   and closes every open buffering layer of the [`OutputEnvironment`].
//!
//! [`RouteTable`] (radix trees via [`matchit`]) is both collector and
//! dispatcher; [`App`] strings everything together and [`Server`] serves it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use spout::{App, Params, Request, Response, RouteGroupComposer, RouteTable, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), spout::Error> {
//!     let mut routes = RouteGroupComposer::new(RouteTable::new());
//!     routes.group("/users", spout::route_data(json!({"auth": "token"})), |users| {
//!         users.get("/{id}", get_user)?;
//!         users.post("", create_user)
//!     })?;
//!
//!     let app = App::new(routes.into_collector());
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).serve(app).await
//! }
//!
//! async fn get_user(_req: Request, args: Params) -> Response {
//!     let id = args.get("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn create_user(req: Request, _: Params) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(r#"{"id":"99"}"#)
//! }
//! ```

mod app;
mod body;
mod config;
mod error;
mod handler;
mod headers;
mod request;
mod response;
mod server;

pub mod emit;
pub mod router;

pub use app::App;
pub use body::{Body, BytesBody, ReaderBody};
pub use config::{Config, EmitterConfig, ServerConfig};
pub use emit::{OutputEnvironment, OutputStack, ResponseEmitter};
pub use error::{BoxError, Error, Result};
pub use handler::{Handler, HandlerInvoker, HandlerOutput};
#[doc(hidden)]
pub use handler::BoxedHandler;
pub use headers::Headers;
pub use http::StatusCode;
pub use request::{Params, Request};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{
    Controller, DispatchResult, Dispatcher, RequestDispatcher, RouteCollector, RouteData,
    RouteDefinition, RouteGroupComposer, RouteTable, deep_merge, route_data,
};
pub use server::Server;
