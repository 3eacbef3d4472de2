//! FileConsumer - appends deliveries to a JSON-lines file

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::{Consumable, Consumer, ContractError, Flush, Message};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

/// Configuration for FileConsumer
#[derive(Debug, Clone)]
pub struct FileConsumerConfig {
    /// Output file, created if missing and appended to otherwise
    pub path: PathBuf,
}

impl FileConsumerConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Option<Self> {
        params.get("path").map(|path| Self {
            path: PathBuf::from(path),
        })
    }
}

/// Envelope line written for untransformed messages
#[derive(Debug, Serialize)]
struct RawLine<'a> {
    subject: &'a str,
    content_type: &'a str,
    channel: &'a str,
    publisher: &'a str,
    subtopic: &'a str,
    protocol: &'a str,
    created: DateTime<Utc>,
    payload: std::borrow::Cow<'a, str>,
}

impl<'a> From<&'a Message> for RawLine<'a> {
    fn from(msg: &'a Message) -> Self {
        Self {
            subject: &msg.subject,
            content_type: &msg.content_type,
            channel: &msg.channel,
            publisher: &msg.publisher,
            subtopic: &msg.subtopic,
            protocol: &msg.protocol,
            created: msg.created,
            payload: String::from_utf8_lossy(&msg.payload),
        }
    }
}

/// Consumer that writes one JSON line per record
///
/// Each delivery is encoded up front and written through under a mutex, so
/// `consume` only succeeds once the lines reached the file. `flush` syncs
/// the file to stable storage.
pub struct FileConsumer {
    name: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileConsumer {
    /// Open (or create) the output file in append mode
    pub fn new(name: impl Into<String>, config: FileConsumerConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            path: config.path,
            file: Mutex::new(File::from_std(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileConsumerConfig::from_params(params).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing 'path' param")
        })?;
        Self::new(name, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(input: &Consumable) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match input {
            Consumable::Records(records) => {
                for record in records {
                    serde_json::to_writer(&mut buf, record)?;
                    buf.push(b'\n');
                }
            }
            Consumable::Raw(msg) => {
                serde_json::to_writer(&mut buf, &RawLine::from(msg))?;
                buf.push(b'\n');
            }
        }
        Ok(buf)
    }

    async fn append(&self, input: &Consumable) -> Result<(), ContractError> {
        let buf = Self::encode(input)
            .map_err(|e| ContractError::consume(&self.name, format!("encode failed: {e}")))?;

        let mut file = self.file.lock().await;
        let written = match file.write_all(&buf).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };
        written.map_err(|e| {
            error!(consumer = %self.name, path = %self.path.display(), error = %e, "write failed");
            ContractError::consume(&self.name, e.to_string())
        })
    }
}

impl Consumer for FileConsumer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_consumer_consume",
        skip(self, input),
        fields(consumer = %self.name, records = input.len())
    )]
    async fn consume(&self, input: Consumable) -> Result<(), ContractError> {
        self.append(&input).await
    }
}

#[async_trait]
impl Flush for FileConsumer {
    #[instrument(name = "file_consumer_flush", skip(self), fields(consumer = %self.name))]
    async fn flush(&self) -> Result<(), ContractError> {
        self.file
            .lock()
            .await
            .sync_data()
            .await
            .map_err(|e| ContractError::consume(&self.name, e.to_string()))?;
        debug!(path = %self.path.display(), "file consumer synced");
        Ok(())
    }
}
