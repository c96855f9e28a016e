use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::models::Mode;
use crate::traits::SnapshotSink;

/// Writes `debug_<mode>.html` into a directory, overwriting the previous one.
#[derive(Debug, Clone)]
pub struct FileSnapshots {
    dir: PathBuf,
}

impl FileSnapshots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot for `mode`.
    pub fn path_for(&self, mode: Mode) -> PathBuf {
        self.dir.join(format!("debug_{mode}.html"))
    }
}

impl SnapshotSink for FileSnapshots {
    async fn save(&self, mode: Mode, html: &str) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(mode);
        tokio::fs::write(&path, html).await?;
        tracing::debug!("Saved HTML to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_one_file_per_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSnapshots::new(tmp.path().join("nested/debug"));

        sink.save(Mode::Listing, "<html>list</html>").await.unwrap();
        sink.save(Mode::Images, "<html>imgs</html>").await.unwrap();

        let listing = std::fs::read_to_string(sink.path_for(Mode::Listing)).unwrap();
        assert_eq!(listing, "<html>list</html>");
        assert!(sink.path_for(Mode::Listing).ends_with("debug_manga.html"));
        assert!(sink.path_for(Mode::Images).exists());
        assert!(!sink.path_for(Mode::Chapters).exists());
    }

    #[tokio::test]
    async fn overwrites_previous_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = FileSnapshots::new(tmp.path());

        sink.save(Mode::Chapters, "first").await.unwrap();
        sink.save(Mode::Chapters, "second").await.unwrap();

        let html = std::fs::read_to_string(sink.path_for(Mode::Chapters)).unwrap();
        assert_eq!(html, "second");
    }

    #[tokio::test]
    async fn unwritable_dir_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let sink = FileSnapshots::new(blocker.join("sub"));

        let err = sink.save(Mode::Listing, "html").await.unwrap_err();

        assert!(matches!(err, AppError::Io(_)));
    }
}
