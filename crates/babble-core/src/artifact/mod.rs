mod object_urls;
mod recording_artifact;

pub use {
    object_urls::ObjectUrls,
    recording_artifact::{FILE_NAME, MIME_TYPE, RecordingArtifact},
};
