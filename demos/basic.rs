//! Minimal trellis service fronting a remote users service.
//!
//! Run with:
//!   USERS_URL=http://localhost:9000 PORT=3000 RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/health
//!   curl -H 'authorization: Bearer dev' http://localhost:3000/users/42
//!   curl -X DELETE -H 'authorization: Bearer dev' http://localhost:3000/users/42

use std::process::ExitCode;

use trellis::client::{ClientError, UsersClient};
use trellis::middleware::{self, Next};
use trellis::{
    IntoResponse, Json, Request, Response, Route, Router, Service, ServiceConfig, StatusCode, config,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let users_url = config::string_env("USERS_URL", "http://localhost:9000");
    let users = match UsersClient::connect(&users_url).await {
        Ok(users) => users,
        Err(e) => {
            tracing::error!(%users_url, "users service: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut app = Router::new();
    app.base(middleware::trace)
        .health()
        .attach("auth", require_token);

    let (get, delete) = (users.clone(), users);
    app.routes([
        Route::get("/users/{id}", move |req: Request| get_user(get.clone(), req)).middleware("auth"),
        Route::delete("/users/{id}", move |req: Request| delete_user(delete.clone(), req))
            .middleware("auth"),
    ]);

    let config = ServiceConfig::from_env().writer(std::io::stdout());
    match Service::new(config, app).start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("service: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn require_token(req: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", config::string_env("API_TOKEN", "dev"));
    if req.header("authorization") != Some(expected.as_str()) {
        return Response::status(StatusCode::UNAUTHORIZED);
    }
    next.run(req).await
}

// GET /users/{id}
async fn get_user(users: UsersClient, req: Request) -> Response {
    let Some(id) = req.param("id").and_then(|id| id.parse::<i64>().ok()) else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    match users.get(id).await {
        Ok(user) => Json(user).into_response(),
        Err(e) => failure(e),
    }
}

// DELETE /users/{id} → 204 No Content
async fn delete_user(users: UsersClient, req: Request) -> Response {
    let Some(id) = req.param("id").and_then(|id| id.parse::<i64>().ok()) else {
        return Response::status(StatusCode::BAD_REQUEST);
    };
    match users.delete(id).await {
        Ok(()) => Response::status(StatusCode::NO_CONTENT),
        Err(e) => failure(e),
    }
}

fn failure(e: ClientError) -> Response {
    let status = match e {
        ClientError::NotFound => StatusCode::NOT_FOUND,
        ClientError::InvalidData => StatusCode::BAD_REQUEST,
        _ => {
            tracing::warn!("users service: {e}");
            StatusCode::BAD_GATEWAY
        }
    };
    Response::status(status)
}
