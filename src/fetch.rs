// src/fetch.rs

use anyhow::{Context, Result};
use reqwest::Client;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{fs, time::sleep};
use tracing::{info, warn};
use url::Url;

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where an input table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(Url),
}

impl Source {
    /// `http://` and `https://` strings are remote; anything else is a path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Source::Remote(url),
            _ => Source::Local(PathBuf::from(raw)),
        }
    }
}

/// File name a URL is cached under: `role`, then its last non-empty path
/// segment. Two inputs sharing a file name land in different files.
fn cache_name(role: &str, url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.csv");
    format!("{}_{}", role, last)
}

/// Download `url` into `dest_dir` as the `role` input, retrying transient
/// failures. Returns the full path of the saved file.
pub async fn download(
    client: &Client,
    url: &Url,
    dest_dir: impl AsRef<Path>,
    role: &str,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating cache directory {}", dest_dir.display()))?;
    let dest_path = dest_dir.join(cache_name(role, url));

    let mut attempt = 0;
    let bytes = loop {
        attempt += 1;
        let resp = client.get(url.as_str()).send().await;
        match resp {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => break bytes,
                Err(e) if attempt < MAX_RETRIES => {
                    warn!(%url, attempt, error = %e, "reading body failed, retrying");
                    sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e).with_context(|| format!("reading body from {}", url)),
            },
            Err(e) if attempt < MAX_RETRIES => {
                warn!(%url, attempt, error = %e, "request failed, retrying");
                sleep(RETRY_DELAY).await;
            }
            Ok(resp) => anyhow::bail!("GET {}: HTTP {}", url, resp.status()),
            Err(e) => return Err(e).with_context(|| format!("GET {}", url)),
        }
    };

    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {}", dest_path.display()))?;
    info!(%url, path = %dest_path.display(), bytes = bytes.len(), "downloaded");
    Ok(dest_path)
}

/// Turn a configured source into a local file, downloading it if needed.
/// `role` names the input and prefixes its cache file.
pub async fn resolve(client: &Client, raw: &str, cache_dir: &Path, role: &str) -> Result<PathBuf> {
    match Source::parse(raw) {
        Source::Local(path) => {
            if !fs::try_exists(&path).await.unwrap_or(false) {
                anyhow::bail!("input file not found: {}", path.display());
            }
            Ok(path)
        }
        Source::Remote(url) => download(client, &url, cache_dir, role).await,
    }
}
