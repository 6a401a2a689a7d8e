use anyhow::Result;
use bytes::Bytes;
use reqwest::{StatusCode, redirect::Policy};
use std::time::Duration;
use url::Url;

pub struct BuildScriptFetcherArgs<'a> {
    pub repository_url: &'a Url,
    pub branch: &'a str,
    pub max_redirects: usize,
    pub request_timeout: Duration,
}

/// Retrieves scripts from the repository's raw-content endpoint.
#[derive(Debug, Clone)]
pub struct ScriptFetcher {
    client: reqwest::Client,
    raw_base_url: String,
}

impl ScriptFetcher {
    /// Create a new [`ScriptFetcher`] with the given arguments.
    pub fn new(args: BuildScriptFetcherArgs) -> Result<Self> {
        let client = reqwest::ClientBuilder::default()
            .redirect(Policy::limited(args.max_redirects))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(5))
            .timeout(args.request_timeout)
            .build()?;
        Ok(Self {
            client,
            raw_base_url: format!(
                "{}/raw/{}/scripts",
                args.repository_url.as_str().trim_end_matches('/'),
                args.branch
            ),
        })
    }

    /// Fetch the whole buffer of a single script below the repository's `scripts/` tree.
    ///
    /// Any upstream status other than 200 collapses to `None`. Transport
    /// failures surface as an error and are left to the caller to resolve.
    pub async fn fetch(&self, path: &str) -> Result<Option<Bytes>, reqwest::Error> {
        let response = self
            .client
            .get(format!("{}/{}", self.raw_base_url, path))
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        Ok(Some(response.bytes().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher_for(repository_url: &str, branch: &str) -> ScriptFetcher {
        ScriptFetcher::new(BuildScriptFetcherArgs {
            repository_url: &Url::parse(repository_url).unwrap(),
            branch,
            max_redirects: 5,
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn raw_base_url_includes_branch() {
        let fetcher = fetcher_for("https://github.com/example/prepare", "develop");
        assert_eq!(
            fetcher.raw_base_url,
            "https://github.com/example/prepare/raw/develop/scripts"
        );
    }

    #[test]
    fn raw_base_url_trims_trailing_slash() {
        let fetcher = fetcher_for("https://github.com/example/prepare/", "main");
        assert_eq!(
            fetcher.raw_base_url,
            "https://github.com/example/prepare/raw/main/scripts"
        );
    }
}
