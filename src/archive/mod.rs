//! Archive streamer
//!
//! Wraps a streaming [`zip::ZipWriter`] so artifacts can be appended as soon
//! as they are exported. The zip writer fills an in-memory spool; after every
//! append (and on finalize) the spool is drained into the async output, so
//! the bytes reach the client progressively and output backpressure pauses
//! the crawl.
//!
//! Finalizing consumes the streamer, so nothing can be appended afterwards.

use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use zip::result::ZipError;
use zip::write::{SimpleFileOptions, StreamWriter};
use zip::{CompressionMethod, ZipWriter};

/// MIME type of the produced archive
pub const CONTENT_TYPE: &str = "application/zip";

/// Suggested download file name
pub const ATTACHMENT_FILENAME: &str = "site-export.zip";

/// Errors raised while writing the archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Duplicate archive entry: {0}")]
    DuplicateEntry(String),

    #[error("Zip encoding failed: {0}")]
    Zip(#[from] ZipError),

    #[error("Failed to write archive output: {0}")]
    Write(#[from] std::io::Error),
}

/// Totals reported once the archive is finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchiveSummary {
    pub entries: usize,
    pub bytes_written: u64,
}

/// Shared in-memory buffer the zip writer encodes into
#[derive(Clone, Default)]
struct Spool(Arc<Mutex<Vec<u8>>>);

impl Spool {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }
}

impl Write for Spool {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Append-only zip archive streamed into an async writer
pub struct ArchiveStreamer<'a, W> {
    zip: ZipWriter<StreamWriter<Spool>>,
    spool: Spool,
    out: &'a mut W,
    options: SimpleFileOptions,
    names: HashSet<String>,
    bytes_written: u64,
}

impl<'a, W> ArchiveStreamer<'a, W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Creates a streamer writing DEFLATE entries at `compression_level`
    ///
    /// Level 0 stores entries uncompressed.
    pub fn new(out: &'a mut W, compression_level: i64) -> Self {
        let spool = Spool::default();
        let options = entry_options(compression_level);

        Self {
            zip: ZipWriter::new_stream(spool.clone()),
            spool,
            out,
            options,
            names: HashSet::new(),
            bytes_written: 0,
        }
    }

    /// Appends one entry and forwards the encoded bytes to the output
    ///
    /// # Returns
    ///
    /// * `Err(ArchiveError::DuplicateEntry)` - `name` was already appended;
    ///   nothing was written
    /// * `Err(ArchiveError::Write)` - the output failed; the archive is unusable
    pub async fn append(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }

        self.zip.start_file(name, self.options)?;
        self.zip.write_all(bytes)?;
        self.names.insert(name.to_string());

        self.drain().await
    }

    /// Number of entries appended so far
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bytes forwarded to the output so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Writes the central directory and flushes the output
    pub async fn finalize(self) -> Result<ArchiveSummary, ArchiveError> {
        let Self {
            zip,
            spool,
            out,
            names,
            mut bytes_written,
            ..
        } = self;

        zip.finish()?;
        let written = drain(&spool, out).await?;
        bytes_written += written;
        out.flush().await?;

        Ok(ArchiveSummary {
            entries: names.len(),
            bytes_written,
        })
    }

    async fn drain(&mut self) -> Result<(), ArchiveError> {
        let written = drain(&self.spool, self.out).await?;
        self.bytes_written += written;
        Ok(())
    }
}

fn entry_options(compression_level: i64) -> SimpleFileOptions {
    if compression_level <= 0 {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(compression_level))
    }
}

/// Moves everything spooled so far into `out`, returning the byte count
async fn drain<W>(spool: &Spool, out: &mut W) -> Result<u64, ArchiveError>
where
    W: AsyncWrite + Unpin + Send,
{
    let chunk = spool.take();
    if !chunk.is_empty() {
        out.write_all(&chunk).await?;
    }
    Ok(chunk.len() as u64)
}
