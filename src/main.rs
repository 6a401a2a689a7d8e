mod server;

use anyhow::Result;
use clap::Parser;
use core::net::SocketAddr;
use dotenvy::dotenv;
use server::{ProxySettings, Server, Settings, UpstreamSettings};
use tracing_subscriber::EnvFilter;
use url::Url;

#[cfg(feature = "rustls-tls")]
#[cfg(feature = "native-tls")]
compile_error!("You can only enable one TLS backend");

#[derive(Parser)]
#[command(author, version, about, long_about)]
struct Arguments {
    /// Internet socket address that the server should be ran on.
    #[arg(
        long = "address",
        env = "GETPREP_ADDRESS",
        default_value = "127.0.0.1:4000"
    )]
    address: SocketAddr,

    /// Base URL of the GitHub repository that installer scripts are served from.
    ///
    /// Also the target of every redirect the server produces.
    #[arg(long = "repository-url", env = "GETPREP_REPOSITORY_URL")]
    repository_url: Url,

    /// Branch of the repository that scripts are fetched from.
    #[arg(long = "branch", env = "GETPREP_BRANCH", default_value = "main")]
    branch: String,

    /// Maximum waiting time for before all incoming requests are aborted.
    #[arg(
        long = "request-timeout",
        env = "GETPREP_REQUEST_TIMEOUT",
        default_value = "15s"
    )]
    request_timeout: humantime::Duration,

    /// Maximum waiting time before requests to the upstream repository are aborted.
    #[arg(
        long = "upstream-request-timeout",
        env = "GETPREP_UPSTREAM_REQUEST_TIMEOUT",
        default_value = "10s"
    )]
    upstream_request_timeout: humantime::Duration,

    /// Maximum amount of redirects to follow when fetching from the upstream before aborting.
    ///
    /// GitHub serves raw content through at least one redirect, so this must stay above zero.
    #[arg(
        long = "upstream-max-redirects",
        env = "GETPREP_UPSTREAM_MAX_REDIRECTS",
        default_value_t = 5
    )]
    upstream_max_redirects: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info")))
        .init();
    let args = Arguments::parse();

    Server::new(Settings {
        request_timeout: *args.request_timeout,
        proxy_settings: ProxySettings {
            repository_url: args.repository_url,
            branch: args.branch,
        },
        upstream_settings: UpstreamSettings {
            request_timeout: *args.upstream_request_timeout,
            max_redirects: args.upstream_max_redirects,
        },
    })?
    .start(&args.address)
    .await
}
