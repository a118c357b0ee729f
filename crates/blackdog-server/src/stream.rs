//! Archive proxying with single-pass digest computation.
//!
//! Upstream bytes are re-chunked to [`NetworkConfig::STREAM_CHUNK_SIZE`]
//! and forwarded as they arrive. When the cached record is missing a
//! digest, both SHA1 and MD5 are computed from the same bytes and recorded
//! once the upstream body has been read in full.

use blackdog_core::config::NetworkConfig;
use blackdog_core::{ArchiveDigests, PluginRegistry};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use md5::Md5;
use sha1::{Digest, Sha1};
use std::io;
use std::sync::Arc;
use tracing::{debug, warn};

/// Computes SHA1 and MD5 of an archive in a single pass.
pub struct ArchiveHasher {
    sha1: Sha1,
    md5: Md5,
    length: u64,
}

impl ArchiveHasher {
    pub fn new() -> Self {
        Self {
            sha1: Sha1::new(),
            md5: Md5::new(),
            length: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.sha1.update(bytes);
        self.md5.update(bytes);
        self.length += bytes.len() as u64;
    }

    pub fn finish(self) -> ArchiveDigests {
        ArchiveDigests {
            sha1: Some(hex::encode(self.sha1.finalize())),
            md5: Some(hex::encode(self.md5.finalize())),
        }
    }
}

impl Default for ArchiveHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Where computed digests are recorded once the archive has been read.
pub struct DigestSink {
    pub registry: Arc<PluginRegistry>,
    pub plugin: String,
    pub version: String,
}

impl DigestSink {
    async fn record(self, hasher: ArchiveHasher) {
        let length = hasher.length;
        let digests = hasher.finish();
        debug!(
            "Computed digests for {} {} ({} bytes)",
            self.plugin, self.version, length
        );
        if let Err(e) = self
            .registry
            .record_archive_digests(&self.plugin, &self.version, digests)
            .await
        {
            warn!(
                "Failed to record digests for {} {}: {}",
                self.plugin, self.version, e
            );
        }
    }
}

struct Forward {
    upstream: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: BytesMut,
    digest: Option<(ArchiveHasher, DigestSink)>,
    finished: bool,
}

/// Forward `upstream` in fixed-size chunks, hashing into `sink` if given.
///
/// Digests are only recorded when the upstream body ends cleanly; a
/// transfer error ends the stream with that error and records nothing.
pub fn forward_archive(
    upstream: BoxStream<'static, reqwest::Result<Bytes>>,
    sink: Option<DigestSink>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let state = Forward {
        upstream,
        buffer: BytesMut::with_capacity(NetworkConfig::STREAM_CHUNK_SIZE),
        digest: sink.map(|sink| (ArchiveHasher::new(), sink)),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if state.buffer.len() >= NetworkConfig::STREAM_CHUNK_SIZE {
                let chunk = state
                    .buffer
                    .split_to(NetworkConfig::STREAM_CHUNK_SIZE)
                    .freeze();
                return Some((Ok(chunk), state));
            }
            if state.finished {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = state.buffer.split().freeze();
                return Some((Ok(rest), state));
            }

            match state.upstream.next().await {
                Some(Ok(bytes)) => {
                    if let Some((hasher, _)) = state.digest.as_mut() {
                        hasher.update(&bytes);
                    }
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    warn!("Archive transfer failed: {}", e);
                    state.finished = true;
                    state.digest = None;
                    state.buffer.clear();
                    return Some((Err(io::Error::other(e)), state));
                }
                None => {
                    state.finished = true;
                    if let Some((hasher, sink)) = state.digest.take() {
                        sink.record(hasher).await;
                    }
                }
            }
        }
    })
}
