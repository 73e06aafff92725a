// Native bridge - the two things the shell does for the player:
// pick files with a native dialog, and hand back a file's bytes

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

/// File picking and raw byte retrieval.
///
/// `read_file` returns a `Send` future so resolutions can run on spawned
/// tasks; `open_files` is awaited in place and may block on a modal dialog.
pub trait NativeBridge: Send + Sync + 'static {
    /// Absolute paths the user picked. Empty when the dialog is cancelled.
    fn open_files(&self) -> impl Future<Output = Vec<PathBuf>>;

    fn read_file(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send;
}

/// Bridge backed by the local filesystem (and `rfd` when built with `dialog`).
#[derive(Debug, Clone, Default)]
pub struct FsBridge;

impl FsBridge {
    pub fn new() -> Self {
        Self
    }
}

impl NativeBridge for FsBridge {
    #[cfg(feature = "dialog")]
    async fn open_files(&self) -> Vec<PathBuf> {
        let picked = rfd::AsyncFileDialog::new()
            .set_title("Add audio files")
            .add_filter("Audio", crate::audio::SUPPORTED_EXTENSIONS)
            .pick_files()
            .await;

        picked
            .unwrap_or_default()
            .into_iter()
            .map(|handle| handle.path().to_path_buf())
            .collect()
    }

    #[cfg(not(feature = "dialog"))]
    async fn open_files(&self) -> Vec<PathBuf> {
        tracing::warn!("Built without the `dialog` feature, no file dialog available");
        Vec::new()
    }

    fn read_file(&self, path: &Path) -> impl Future<Output = io::Result<Vec<u8>>> + Send {
        let path = path.to_path_buf();
        async move { tokio::fs::read(path).await }
    }
}
