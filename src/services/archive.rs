//! archive.org metadata and file retrieval over `ureq`

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
    time::Duration,
};

use log::{debug, info};

use crate::{
    config::ArchiveConfig,
    links,
    pipeline::{collaborators::Downloader, error::DownloadError},
    preview::RecordSource,
    resolve::record::RawRecord,
    services::error::FetchError,
};

const USER_AGENT: &str = concat!("archive-to-yt/", env!("CARGO_PKG_VERSION"));
const PROGRESS_STEP: u64 = 16 * 1024 * 1024;

pub struct ArchiveClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ArchiveClient {
    pub fn new(config: &ArchiveConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: config.base_url.clone(),
        }
    }
}

impl RecordSource for ArchiveClient {
    fn fetch_record(&self, identifier: &str) -> Result<RawRecord, FetchError> {
        let url = links::metadata_url(&self.base_url, identifier);
        debug!("GET {url}");
        let response = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| fetch_failure(&url, e))?;
        let record: RawRecord = response.into_json().map_err(|e| FetchError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        // unknown identifiers come back as `{}`
        if record.metadata.is_empty() && record.files.is_empty() {
            return Err(FetchError::NotFound {
                identifier: identifier.to_string(),
            });
        }
        Ok(record)
    }

    fn download_base(&self) -> &str {
        &self.base_url
    }
}

impl Downloader for ArchiveClient {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        info!("downloading {url}");
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => DownloadError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(t) => DownloadError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            },
        })?;
        let expected: Option<u64> = response
            .header("Content-Length")
            .and_then(|v| v.parse().ok());

        let mut reader = Progress {
            inner: response.into_reader(),
            url,
            read: 0,
            next_report: PROGRESS_STEP,
            expected,
        };
        let mut writer = BufWriter::new(File::create(dest)?);
        let written = io::copy(&mut reader, &mut writer)?;
        writer.flush()?;
        Ok(written)
    }
}

fn fetch_failure(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.to_string(),
            status,
        },
        ureq::Error::Transport(t) => FetchError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

/// Logs how far a streamed body has got
struct Progress<'a, R> {
    inner: R,
    url: &'a str,
    read: u64,
    next_report: u64,
    expected: Option<u64>,
}

impl<R: Read> Read for Progress<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if self.read >= self.next_report {
            self.next_report += PROGRESS_STEP;
            match self.expected {
                Some(total) if total > 0 => info!(
                    "{}: {} of {} MiB ({}%)",
                    self.url,
                    self.read / (1024 * 1024),
                    total / (1024 * 1024),
                    self.read * 100 / total
                ),
                _ => info!("{}: {} MiB", self.url, self.read / (1024 * 1024)),
            }
        }
        Ok(n)
    }
}
