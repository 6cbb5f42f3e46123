//! Minimal spout example: grouped JSON endpoints, a streamed download, and
//! a controller registered by name.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/api/v1/users/42
//!   curl -X POST http://localhost:3000/api/v1/users -d '{"name":"alice"}'
//!   curl -I http://localhost:3000/api/v1/users/42
//!   curl http://localhost:3000/download

use serde_json::json;
use spout::{
    App, Config, Controller, Params, ReaderBody, Request, Response, ResponseEmitter,
    RouteGroupComposer, RouteTable, Server, StatusCode, route_data,
};

#[tokio::main]
async fn main() -> Result<(), spout::Error> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut routes = RouteGroupComposer::new(RouteTable::new());
    routes.group("/api", route_data(json!({"auth": {"scheme": "token"}})), |api| {
        api.group("/v1", route_data(json!({"auth": {"scope": "users"}})), |v1| {
            v1.get("/users/{id}", get_user)?;
            v1.post("/users", create_user)?;
            v1.delete("/users/{id}", delete_user)
        })
    })?;
    routes.add_route(["GET"], "/download", Controller::named("download"), Default::default())?;

    let app = App::new(routes.into_collector())
        .with_emitter(ResponseEmitter::from_config(&config.emitter)?)
        .controller("download", download);

    Server::from_config(&config.server).serve(app).await
}

// GET /api/v1/users/{id}
async fn get_user(_req: Request, args: Params) -> Response {
    let id = args.get("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

// POST /api/v1/users
async fn create_user(req: Request, _: Params) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }
    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/api/v1/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}

// DELETE /api/v1/users/{id} → 204 No Content
async fn delete_user(_req: Request, _: Params) -> StatusCode {
    StatusCode::NO_CONTENT
}

// GET /download: a body of unknown size, streamed in chunks.
async fn download(_req: Request, _: Params) -> Response {
    let lines: Vec<u8> = (0..1000).flat_map(|i| format!("line {i}\n").into_bytes()).collect();
    Response::builder()
        .header("content-type", "text/plain")
        .body(ReaderBody::new(std::io::Cursor::new(lines)))
}
