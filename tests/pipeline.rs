//! End-to-end: register in groups, dispatch, invoke, emit into an output stack.

use std::io;

use serde_json::{Value, json};
use spout::emit::LayerFlags;
use spout::{
    App, Controller, DispatchResult, Dispatcher, Error, OutputEnvironment, OutputStack, Params,
    ReaderBody, Request, RequestDispatcher, Response, ResponseEmitter, RouteData,
    RouteGroupComposer, RouteTable, route_data,
};

async fn article(_: Request, args: Params) -> Response {
    Response::builder()
        .header("Set-Cookie", "seen=1")
        .header("Set-Cookie", "theme=dark")
        .text(format!("article {}", args.get("slug").unwrap_or("?")))
}

async fn feed(_: Request, _: Params) -> Response {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
    Response::builder()
        .header("Content-Type", "application/octet-stream")
        .body(ReaderBody::new(io::Cursor::new(data)))
}

async fn broken(_: Request, _: Params) -> Result<Response, io::Error> {
    Err(io::Error::other("database unavailable"))
}

fn routes() -> RouteTable {
    let mut routes = RouteGroupComposer::new(RouteTable::new());
    routes
        .group("/blog", route_data(json!({"cache": {"ttl": 60}})), |blog| {
            blog.get("/{slug}", article)?;
            blog.group("/admin", route_data(json!({"cache": {"ttl": 0}, "auth": true})), |admin| {
                admin.add_route(["GET", "POST"], "/feed", Controller::handler(feed), RouteData::new())
            })
        })
        .unwrap();
    routes.get("/broken", broken).unwrap();
    routes.into_collector()
}

#[test]
fn group_data_reaches_the_matched_route() {
    let table = routes();
    match table.dispatch("POST", "/blog/admin/feed").unwrap() {
        DispatchResult::Matched { data, .. } => {
            assert_eq!(Value::Object(data), json!({"cache": {"ttl": 0}, "auth": true}));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn failed_group_leaves_parent_scope_intact() {
    let mut routes = RouteGroupComposer::new(RouteTable::new());
    let result = routes.group("/v1", route_data(json!({"v": 1})), |v1| {
        v1.group("/bad", route_data(json!({"v": 2})), |bad| bad.on("NOT A METHOD", "/x", article))
    });
    assert!(matches!(result, Err(Error::InvalidArgument(_))));

    routes.get("/after", article).unwrap();
    assert_eq!(routes.prefix(), "");

    let dispatcher = RequestDispatcher::new(routes.into_collector());
    match dispatcher.dispatch(&Request::new("GET", "/after")).unwrap() {
        DispatchResult::Matched { data, .. } => assert!(data.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn get_streams_body_and_keeps_repeated_headers() {
    let app = App::new(routes());
    let mut out = OutputStack::new(Vec::new());
    app.handle(&Request::new("GET", "/blog/hello-world"), &mut out).await.unwrap();

    assert_eq!(out.status_line(), Some("HTTP/1.1 200 OK"));
    assert_eq!(out.header_values("set-cookie"), ["seen=1", "theme=dark"]);
    assert_eq!(out.sink(), b"article hello-world");
}

#[tokio::test]
async fn unsized_body_is_streamed_through_nested_layers() {
    let app = App::new(routes()).with_emitter(ResponseEmitter::new(1000).unwrap());
    let mut out = OutputStack::new(Vec::new());
    out.push_layer(LayerFlags::all());
    out.push_layer(LayerFlags::all());

    app.handle(&Request::new("GET", "/blog/admin/feed"), &mut out).await.unwrap();

    let expected: Vec<u8> = (0..10_000u32).map(|i| (i % 256) as u8).collect();
    assert_eq!(out.buffer_level(), 0);
    assert_eq!(out.sink().as_slice(), expected.as_slice());
}

#[tokio::test]
async fn head_request_sends_headers_only() {
    let app = App::new(routes());
    let mut out = OutputStack::new(Vec::new());
    let outer = out.push_layer(LayerFlags::REMOVABLE | LayerFlags::FLUSHABLE);
    out.push_layer(LayerFlags::REMOVABLE | LayerFlags::CLEANABLE);
    out.write(b"debug noise").unwrap();

    app.handle(&Request::new("HEAD", "/blog/hello"), &mut out).await.unwrap();

    assert_eq!(out.status_line(), Some("HTTP/1.1 200 OK"));
    assert_eq!(out.header_values("content-type"), ["text/plain; charset=utf-8"]);
    assert!(out.sink().is_empty());
    // The flush-only layer cannot be cleaned and stays open, untouched.
    assert_eq!(out.buffer_level(), 1);
    assert_eq!(out.layer_contents(outer), Some(&b""[..]));
}

#[tokio::test]
async fn fast_completion_ends_the_response() {
    let app = App::new(routes());
    let mut out = OutputStack::new(Vec::new()).with_fast_completion();
    out.push_layer(LayerFlags::FLUSHABLE);

    app.handle(&Request::new("GET", "/blog/fast"), &mut out).await.unwrap();

    assert!(out.is_completed());
    assert_eq!(out.sink(), b"article fast");
}

#[tokio::test]
async fn handler_failure_reaches_the_caller_and_nothing_is_emitted() {
    let app = App::new(routes());
    let mut out = OutputStack::new(Vec::new());
    let err = app.handle(&Request::new("GET", "/broken"), &mut out).await.unwrap_err();

    let Error::Handler(source) = err else { panic!("expected a handler error") };
    assert_eq!(source.to_string(), "database unavailable");
    assert_eq!(out.status_line(), None);
    assert!(out.sink().is_empty());
}

#[tokio::test]
async fn method_not_allowed_is_emitted_with_allow_header() {
    let app = App::new(routes());
    let mut out = OutputStack::new(Vec::new());
    app.handle(&Request::new("DELETE", "/blog/admin/feed"), &mut out).await.unwrap();

    assert_eq!(out.status_line(), Some("HTTP/1.1 405 Method Not Allowed"));
    assert_eq!(out.header_values("allow"), ["GET, HEAD, POST"]);
}
