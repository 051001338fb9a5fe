use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use reqwest::Response;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error};

use crate::parse::{parse_in_background, parse_record_metadata};
use crate::{CatalogClient, Error, ProgressReporter, RecordId, Result};

/// Fetches a record's XML and saves it under the output directory.
#[derive(Debug)]
pub struct RecordDownloader {
    catalog: CatalogClient,
    output_dir: PathBuf,
}

impl RecordDownloader {
    pub fn new(catalog: CatalogClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            output_dir: output_dir.into(),
        }
    }

    /// Detail page -> form fields -> interstitial POST whose body is streamed to
    /// `<output_dir>/<filename>`. Returns the path written.
    pub async fn download(&self, id: &RecordId) -> Result<PathBuf> {
        let html = self.catalog.get_html(&self.catalog.detail_url(id)).await?;
        let metadata = parse_in_background(html, {
            let id = id.clone();
            move |html: &str| parse_record_metadata(&id, html)
        })
        .await?;

        let dest = self.destination(id, &metadata.filename)?;
        let res = self.catalog.post_interstitial(id, &metadata).await?;
        persist(res, &dest).await?;
        Ok(dest)
    }

    /// The server-provided filename is used as is, but only as a plain file name.
    fn destination(&self, id: &RecordId, filename: &str) -> Result<PathBuf> {
        if filename.contains(['/', '\\']) || filename == "." || filename == ".." {
            return Err(Error::UnsafeFilename {
                id: id.to_string(),
                filename: filename.to_owned(),
            });
        }
        Ok(self.output_dir.join(filename))
    }
}

/// Streams the body into a temporary file next to `dest` and renames it over `dest`
/// once complete. Each call gets its own `.<filename>.XXXXXX.part` file, so records
/// sharing a filename never write into each other; the last rename wins. The
/// temporary file is removed on any error.
async fn persist(mut res: Response, dest: &Path) -> Result<()> {
    let (dir, filename) = match (dest.parent(), dest.file_name()) {
        (Some(dir), Some(filename)) => (dir, filename.to_string_lossy()),
        _ => return Err(Error::Io(io::Error::other("destination has no file name"))),
    };
    let (file, part) = tempfile::Builder::new()
        .prefix(&format!(".{filename}."))
        .suffix(".part")
        .tempfile_in(dir)?
        .into_parts();

    // `part` deletes the file when dropped, which covers every early return.
    let mut file = fs::File::from_std(file);
    while let Some(chunk) = res.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    drop(file);

    part.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

#[derive(Debug)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Failed(Error),
}

/// One record to download, owned and run once by a worker.
pub struct DownloadTask {
    id: RecordId,
    downloader: Arc<RecordDownloader>,
    progress: ProgressReporter,
}

impl DownloadTask {
    pub fn new(
        id: RecordId,
        downloader: Arc<RecordDownloader>,
        progress: ProgressReporter,
    ) -> Self {
        Self {
            id,
            downloader,
            progress,
        }
    }

    /// Runs the download. The progress reporter advances exactly once, on success or failure.
    pub async fn run(self) -> DownloadOutcome {
        let outcome = match self.downloader.download(&self.id).await {
            Ok(path) => {
                debug!(id = %self.id, path = %path.display(), "saved record");
                DownloadOutcome::Saved(path)
            }
            Err(err) => {
                error!(id = %self.id, "error on item: {err}");
                DownloadOutcome::Failed(err)
            }
        };
        self.progress.increment();
        outcome
    }
}
