use crate::{CoreError, CoreResult, artifact::ObjectUrls, audio::AudioChunk};

use std::{
    fs,
    io::{Cursor, Write},
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{info, instrument};

/// Container label for every artifact.
pub const MIME_TYPE: &str = "audio/wav";
/// Name every artifact is saved under.
pub const FILE_NAME: &str = "audio.wav";

/// A finalized recording: the session's chunks packaged into one WAV file.
///
/// The bytes never change after packaging. Clones share them; the download
/// URL is released by [`RecordingArtifact::discard`].
#[derive(Clone)]
pub struct RecordingArtifact {
    data: Arc<[u8]>,
    download_url: String,
    chunk_count: usize,
    payload_len: usize,
    sample_rate: u32,
    urls: ObjectUrls,
}

impl RecordingArtifact {
    /// Concatenate `chunks` as-is into a mono 16-bit WAV container and
    /// register it under a fresh URL.
    ///
    /// An empty chunk list yields a valid header-only file.
    #[track_caller]
    #[instrument(skip(chunks, urls), fields(chunk_count = chunks.len()))]
    pub(crate) fn package(
        chunks: Vec<AudioChunk>,
        sample_rate: u32,
        urls: &ObjectUrls,
    ) -> CoreResult<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let payload_len: usize = chunks.iter().map(AudioChunk::len).sum();
        let mut buf = Vec::with_capacity(payload_len + 44);

        let mut writer =
            WavWriter::new(Cursor::new(&mut buf), spec).map_err(|e| CoreError::Encoding {
                reason: format!("Failed to write WAV header: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        for chunk in &chunks {
            for pair in chunk.as_bytes().chunks_exact(2) {
                writer
                    .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                    .map_err(|e| CoreError::Encoding {
                        reason: format!("Failed to write WAV data: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    })?;
            }
        }

        writer.finalize().map_err(|e| CoreError::Encoding {
            reason: format!("Failed to finalize WAV: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let data: Arc<[u8]> = Arc::from(buf);
        let download_url = urls.create(Arc::clone(&data));

        info!(
            url = %download_url,
            bytes = data.len(),
            payload_len,
            sample_rate,
            "Recording packaged"
        );

        Ok(Self {
            data,
            download_url,
            chunk_count: chunks.len(),
            payload_len,
            sample_rate,
            urls: urls.clone(),
        })
    }

    /// The full container bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The concatenated chunk bytes, without the container header.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.data.len() - self.payload_len..]
    }

    /// Always [`MIME_TYPE`].
    pub fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    /// Always [`FILE_NAME`].
    pub fn file_name(&self) -> &'static str {
        FILE_NAME
    }

    /// URL resolvable through the registry until discarded.
    pub fn download_url(&self) -> &str {
        &self.download_url
    }

    /// Number of chunks packaged.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Sample rate written into the header.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether the download URL still resolves.
    pub fn is_live(&self) -> bool {
        self.urls.resolve(&self.download_url).is_some()
    }

    /// Save the artifact as `dir/audio.wav`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the directory cannot be created or the
    /// file cannot be written.
    #[track_caller]
    #[instrument(skip(self), fields(url = %self.download_url))]
    pub fn download(&self, dir: &Path) -> CoreResult<PathBuf> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(FILE_NAME);

        let mut file = fs::File::create(&path)?;
        file.write_all(&self.data)?;
        file.sync_all()?;

        info!(path = ?path, bytes = self.data.len(), "Recording saved");

        Ok(path)
    }

    /// Release the download URL. Returns `false` if already released.
    pub fn discard(&self) -> bool {
        self.urls.revoke(&self.download_url)
    }
}

impl std::fmt::Debug for RecordingArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingArtifact")
            .field("download_url", &self.download_url)
            .field("mime_type", &MIME_TYPE)
            .field("bytes", &self.data.len())
            .field("chunk_count", &self.chunk_count)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
