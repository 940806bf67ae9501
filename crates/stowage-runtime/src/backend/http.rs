//! Downloads over HTTP

use super::{BundleFetcher, FetchRequest};
use crate::pending::Pending;
use crate::runtime::IoRuntime;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::time::Duration;
use stowage_core::{StowageError, StowageResult};

/// Fetches bundles with a blocking `ureq` agent on the I/O runtime
///
/// The body streams through the lent buffer slot into a temporary file next
/// to the destination, which replaces the destination only once the hash
/// checks out.
#[derive(Clone)]
pub struct HttpFetcher {
    runtime: IoRuntime,
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(runtime: IoRuntime) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(30))
            .build();
        Self { runtime, agent }
    }

    /// Use a preconfigured agent (proxies, TLS, timeouts)
    pub fn with_agent(runtime: IoRuntime, agent: ureq::Agent) -> Self {
        Self { runtime, agent }
    }
}

impl BundleFetcher for HttpFetcher {
    fn begin_fetch(&self, request: FetchRequest) -> Pending<u64> {
        let agent = self.agent.clone();
        self.runtime
            .spawn_blocking(move || fetch_to_file(&agent, &request))
    }
}

fn convert_error(bundle: &str, e: ureq::Error) -> StowageError {
    let reason = match e {
        ureq::Error::Status(code, response) => {
            format!("HTTP {} from {}", code, response.get_url())
        }
        other => other.to_string(),
    };
    StowageError::DownloadFailed {
        bundle: bundle.to_string(),
        reason,
    }
}

fn fetch_to_file(agent: &ureq::Agent, request: &FetchRequest) -> StowageResult<u64> {
    let failed = |reason: String| StowageError::DownloadFailed {
        bundle: request.bundle.clone(),
        reason,
    };

    tracing::debug!("Downloading {} from {}", request.bundle, request.url);
    let response = agent
        .get(&request.url)
        .call()
        .map_err(|e| convert_error(&request.bundle, e))?;

    let dir = request
        .destination
        .parent()
        .ok_or_else(|| failed(format!("no parent for {}", request.destination.display())))?;
    fs::create_dir_all(dir)?;
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;

    let mut reader = response.into_reader();
    let mut hasher = Sha256::new();
    let mut total = 0u64;
    {
        let mut buffer = request.buffer.lock();
        if buffer.is_empty() {
            return Err(StowageError::Internal("download buffer has no capacity".to_string()));
        }
        loop {
            let n = reader.read(&mut buffer[..]).map_err(|e| failed(e.to_string()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            temp.write_all(&buffer[..n])?;
            total += n as u64;
        }
    }
    temp.flush()?;

    if let Some(expected) = &request.expected_hash {
        let actual = hex::encode(hasher.finalize());
        let expected_hex = expected.strip_prefix("sha256:").unwrap_or(expected);
        if !actual.eq_ignore_ascii_case(expected_hex) {
            return Err(StowageError::ChecksumMismatch {
                bundle: request.bundle.clone(),
                expected: expected.clone(),
                actual: format!("sha256:{actual}"),
            });
        }
    }

    temp.persist(&request.destination)
        .map_err(|e| StowageError::Io(e.to_string()))?;
    tracing::debug!("Downloaded {} ({} bytes)", request.bundle, total);
    Ok(total)
}
