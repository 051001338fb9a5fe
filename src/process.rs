use std::{collections::HashSet, path::Path, sync::Arc};

use chrono::Local;
use tokio::{fs::DirBuilder, sync::Semaphore, task::JoinSet};
use tracing::error;

use crate::config::CrawlConfig;
use crate::parse::{parse_identifiers, parse_in_background, parse_pagination};
use crate::{
    info_time, CatalogClient, DownloadOutcome, DownloadTask, PageDescriptor, ProgressReporter,
    RecordDownloader, RecordId, Result,
};

/// Tally of a finished crawl.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages: u32,
    pub items: u64,
    pub dispatched: usize,
    pub saved: usize,
    pub failed: usize,
    /// Attempts the progress reporter counted.
    pub completed: u64,
}

/// Crawls every listing page of a fonds and downloads each record found.
///
/// Failing to read the fonds' page count aborts the run. A broken listing page is
/// skipped and a failed record only counts as failed; neither stops the crawl.
pub async fn process_fonds(config: &CrawlConfig) -> Result<CrawlReport> {
    let start_time = Local::now();
    let catalog = CatalogClient::new(config.base_url.clone());

    create_output_dir(&config.output_dir).await?;

    let desc = fetch_page_metadata(&catalog, config.fonds).await?;
    // Shown whatever the log filter, ahead of the bar.
    println!("{}", fonds_header(config.fonds, &desc));

    let progress = ProgressReporter::new(desc.items);
    let downloader = Arc::new(RecordDownloader::new(catalog.clone(), &config.output_dir));
    let semaphore = Arc::new(Semaphore::new(config.workers));
    let mut workers = JoinSet::new();

    let mut report = CrawlReport {
        pages: desc.pages,
        items: desc.items,
        ..Default::default()
    };

    // Identifiers repeated on several listing pages are only downloaded once.
    let mut seen = HashSet::new();
    for page in 0..desc.pages {
        let ids = extract_identifiers(&catalog, config.fonds, page).await;
        for id in ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            let task = DownloadTask::new(id, downloader.clone(), progress.clone());
            workers.spawn({
                let semaphore = semaphore.clone();
                async move {
                    // The semaphore is never closed, so acquiring can't fail.
                    let _permit = semaphore.acquire_owned().await;
                    task.run().await
                }
            });
            report.dispatched += 1;
        }
    }
    info_time!(start_time, "Dispatched {} records", report.dispatched);

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(DownloadOutcome::Saved(_)) => report.saved += 1,
            Ok(DownloadOutcome::Failed(_)) => report.failed += 1,
            Err(err) => {
                error!("Tokio Join Error, couldn't await a download! {err}");
                report.failed += 1;
            }
        }
    }
    progress.finalize();
    report.completed = progress.completed();

    info_time!(
        start_time,
        "Finished fonds {}: {} saved, {} failed",
        config.fonds,
        report.saved,
        report.failed
    );
    Ok(report)
}

fn fonds_header(fonds: u32, desc: &PageDescriptor) -> String {
    format!("# fonds: {fonds} - pages: {} - items: {}", desc.pages, desc.items)
}

/// Reads page and item counts from the fonds' bare listing page.
pub async fn fetch_page_metadata(catalog: &CatalogClient, fonds: u32) -> Result<PageDescriptor> {
    let body = catalog.get_html(&catalog.listing_url(fonds, None)).await?;
    parse_pagination(&body)
}

/// Identifiers on one listing page. A page that can't be fetched or parsed is
/// logged and yields no identifiers.
pub async fn extract_identifiers(
    catalog: &CatalogClient,
    fonds: u32,
    page: u32,
) -> HashSet<RecordId> {
    match fetch_identifiers(catalog, fonds, page).await {
        Ok(ids) => ids,
        Err(err) => {
            error!(fonds, page, "skipping listing page: {err}");
            HashSet::new()
        }
    }
}

async fn fetch_identifiers(
    catalog: &CatalogClient,
    fonds: u32,
    page: u32,
) -> Result<HashSet<RecordId>> {
    let html = catalog.get_html(&catalog.listing_url(fonds, Some(page))).await?;
    parse_in_background(html, parse_identifiers).await
}

async fn create_output_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await?;
    Ok(())
}
