//! Demo server built on axum-plus.
//!
//! ```text
//! axum-plus --config app.toml --bind 127.0.0.1:8080
//!
//! GET  /health            → {"code":0,"message":"ok","data":{"version":..}}
//! POST /api/users         → bind + validate a new user
//! GET  /api/users/{id}    → look one up
//! ```

use std::path::PathBuf;

use axum::response::Response;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use validator::Validate;

use axum_plus::config::{load_config, Settings};
use axum_plus::observability::{self, Field};
use axum_plus::{App, Context, Error};

#[derive(Parser)]
#[command(name = "axum-plus")]
#[command(about = "Demo server for the axum-plus context and router wrappers", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct CreateUser {
    #[validate(length(min = 1, max = 64))]
    name: String,
    #[validate(email)]
    email: String,
}

#[derive(Debug, Serialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

async fn health(ctx: Context) -> Result<Response, Error> {
    ctx.json_success(
        Some(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })),
        "",
    )
}

async fn create_user(mut ctx: Context) -> Result<Response, Error> {
    let payload: CreateUser = ctx.bind_and_validate().await?;
    ctx.log_info("user created", [Field::new("email", payload.email.clone())]);
    ctx.json_success(
        Some(User {
            id: 1,
            name: payload.name,
            email: payload.email,
        }),
        "created",
    )
}

async fn get_user(ctx: Context) -> Result<Response, Error> {
    let id: u64 = ctx
        .param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| Error::bad_request("id must be a number"))?;

    if id != 1 {
        ctx.log_warn("user not found", [Field::new("id", id)]);
        return ctx.json_fail_with_code(404, None::<()>, "user not found");
    }

    ctx.json_success(
        Some(User {
            id,
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }),
        "",
    )
}

async fn not_found(ctx: Context) -> Result<Response, Error> {
    Err(Error::not_found(format!("no route for {}", ctx.path())))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };
    if let Some(bind) = cli.bind {
        settings.server.bind_address = bind;
    }

    let _guard = observability::init(&settings.logging, &settings.app_name)?;

    observability::log_info(
        "Configuration loaded",
        [
            Field::new("app_name", settings.app_name.clone()),
            Field::new("bind_address", settings.server.bind_address.clone()),
        ],
    );

    let listener = TcpListener::bind(&settings.server.bind_address).await?;

    let app = App::new(settings)?;
    let api = app
        .group("/api")
        .post("/users", create_user)
        .get("/users/{id}", get_user);
    let app = app
        .get("/health", health)
        .mount(api)
        .route_not_found(not_found);

    app.serve(listener).await?;

    observability::log_info("Shutdown complete", []);
    Ok(())
}
