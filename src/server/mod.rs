mod fetcher;
mod routes;

use anyhow::Result;
use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self as axum_middleware, Next},
    response::Response,
    routing::get,
};
use core::{net::SocketAddr, time::Duration};
use fetcher::{BuildScriptFetcherArgs, ScriptFetcher};
use reqwest::header;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    normalize_path::NormalizePathLayer,
    timeout::TimeoutLayer,
    trace::{self, TraceLayer},
};
use tracing::{Level, info};
use url::Url;

#[derive(Debug)]
pub struct Server {
    router_inner: Router,
}

/// Settings to run the server with.
#[derive(Debug, Clone)]
pub struct Settings {
    /// How long that can elapse before an in-flight request is abandoned for taking too long.
    pub request_timeout: Duration,

    /// See [`ProxySettings`].
    pub proxy_settings: ProxySettings,

    /// See [`UpstreamSettings`].
    pub upstream_settings: UpstreamSettings,
}

/// Configuration options describing the repository that scripts are served from.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Base URL of the GitHub repository.
    ///
    /// Every request that does not resolve to a downloadable script is
    /// redirected here.
    pub repository_url: Url,

    /// Branch that scripts are fetched from.
    pub branch: String,
}

/// Configuration options used when making any call to the upstream repository.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// How long that can elapse after sending a request to the upstream before it's
    /// abandoned and considered failed.
    pub request_timeout: Duration,

    /// The maximum amount of redirects to follow when making a request to the upstream
    /// before abandoning the request.
    pub max_redirects: usize,
}

#[derive(Debug)]
struct AppState {
    fetcher: ScriptFetcher,
    settings: Settings,
}

impl Server {
    /// Create a new server with the provided settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let router = Router::new()
            .route("/", get(routes::index_handler))
            .route("/status", get(routes::status_handler))
            .route("/{*path}", get(routes::scripts_handler))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(TimeoutLayer::new(settings.request_timeout))
            .layer(NormalizePathLayer::trim_trailing_slash())
            .layer(CatchPanicLayer::new())
            .layer(axum_middleware::from_fn(Server::header_middleware))
            .with_state(Arc::new(AppState {
                fetcher: ScriptFetcher::new(BuildScriptFetcherArgs {
                    repository_url: &settings.proxy_settings.repository_url,
                    branch: &settings.proxy_settings.branch,
                    max_redirects: settings.upstream_settings.max_redirects,
                    request_timeout: settings.upstream_settings.request_timeout,
                })?,
                settings,
            }));

        Ok(Self {
            router_inner: router,
        })
    }

    /// Start the server and expose it locally on the provided [`SocketAddr`].
    pub async fn start(self, address: &SocketAddr) -> Result<()> {
        let tcp_listener = TcpListener::bind(&address).await?;
        info!("Listening on http://{}", tcp_listener.local_addr()?);
        axum::serve(tcp_listener, self.router_inner)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;
        Ok(())
    }

    // https://github.com/tokio-rs/axum/blob/15917c6dbcb4a48707a20e9cfd021992a279a662/examples/graceful-shutdown/src/main.rs#L55
    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    async fn header_middleware(request: Request, next: Next) -> Response {
        let mut response = next.run(request).await;
        response.headers_mut().append(
            header::SERVER,
            HeaderValue::from_static(env!("CARGO_PKG_NAME")),
        );
        response
            .headers_mut()
            .append("X-Robots-Tag", HeaderValue::from_static("none"));
        response
    }
}
