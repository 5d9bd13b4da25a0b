use crate::config::default_download_dir;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where finished recordings are saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives `audio.wav`.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
        }
    }
}
