use std::{fs::OpenOptions, net::SocketAddr, path::PathBuf, process::exit, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use expense_tracker::{AppState, build_router, graceful_shutdown, logging_middleware, serve_io};

/// The MCP server for logging expenses.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "expense.db")]
    db_path: PathBuf,

    /// File path to the JSON category catalog.
    #[arg(long, default_value = "categories.json")]
    categories_path: PathBuf,

    /// The address to listen on.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,

    /// Serve a single MCP session over stdin/stdout instead of HTTP.
    ///
    /// Console logs go to stderr so they do not mix with protocol messages.
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    setup_logging(args.stdio);

    let state = match AppState::new(&args.db_path, &args.categories_path) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!(
                "Could not initialize the database at {}: {error}",
                args.db_path.display()
            );
            exit(1);
        }
    };

    if !args.categories_path.is_file() {
        tracing::warn!(
            "Category catalog {} does not exist, reads will fail until it is created",
            args.categories_path.display()
        );
    }

    if args.stdio {
        tracing::info!("Serving MCP over stdin/stdout");
        if let Err(error) = serve_io(state, tokio::io::stdin(), tokio::io::stdout()).await {
            tracing::error!("Server error: {error}");
            exit(1);
        }
        return;
    }

    let addr: SocketAddr = match format!("{}:{}", args.host, args.port).parse() {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!("Invalid listen address {}:{}: {error}", args.host, args.port);
            exit(1);
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(state).layer(middleware::from_fn(logging_middleware)),
    );

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        exit(1);
    }
}

fn setup_logging(use_stderr: bool) {
    let (stdout_log, stderr_log) = if use_stderr {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            ),
        )
    } else {
        (Some(tracing_subscriber::fmt::layer().pretty()), None)
    };

    let log_file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
    {
        Ok(file) => file,
        Err(error) => {
            eprintln!("Could not create log file: {error}");
            exit(1);
        }
    };

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(stdout_log.with_filter(filter::LevelFilter::INFO))
        .with(stderr_log.with_filter(filter::LevelFilter::INFO))
        .with(debug_log.with_filter(filter::LevelFilter::DEBUG))
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Tool failures are logged where they happen, so skip the default 5xx logging.
        .on_failure(());

    router.layer(tracing_layer)
}
