//! Command line and environment configuration of a crawl.

use std::path::PathBuf;

use clap::{builder::RangedU64ValueParser, Parser};

use crate::{BASE_URL, OUTPUT_DIR, WORKERS};

#[derive(Debug, Parser)]
#[command(name = "manus")]
#[command(about = "Download the TEI XML of every record in a Manus Online fonds")]
#[command(version)]
pub struct Args {
    /// Fonds identifier
    #[arg(long = "fonds-id", env = "MANUS_FONDS_ID", default_value_t = 0)]
    pub fonds_id: u32,

    /// Directory the XML files are saved in
    #[arg(long, env = "MANUS_OUTPUT_DIR", default_value = OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Catalog host
    #[arg(long, env = "MANUS_BASE_URL", default_value = BASE_URL)]
    pub base_url: String,

    /// Number of records downloaded concurrently
    #[arg(
        long,
        env = "MANUS_WORKERS",
        default_value_t = WORKERS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub workers: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Everything a crawl needs to run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub fonds: u32,
    pub output_dir: PathBuf,
    pub base_url: String,
    pub workers: usize,
}

impl Args {
    /// `None` when no fonds was given, in which case there is nothing to crawl.
    pub fn into_config(self) -> Option<CrawlConfig> {
        if self.fonds_id == 0 {
            return None;
        }
        Some(CrawlConfig {
            fonds: self.fonds_id,
            output_dir: self.output_dir,
            base_url: self.base_url,
            workers: self.workers,
        })
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "manus=info"
        } else {
            "manus=warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_public_catalog() {
        let config = Args::try_parse_from(["manus", "--fonds-id", "485"])
            .unwrap()
            .into_config()
            .unwrap();

        assert_eq!(config.fonds, 485);
        assert_eq!(config.output_dir, PathBuf::from("manus-data"));
        assert_eq!(config.base_url, "https://manus.iccu.sbn.it");
        assert_eq!(config.workers, 8);
    }

    #[test]
    fn missing_or_zero_fonds_means_nothing_to_do() {
        let args = Args::try_parse_from(["manus"]).unwrap();
        assert!(args.into_config().is_none());

        let args = Args::try_parse_from(["manus", "--fonds-id", "0"]).unwrap();
        assert!(args.into_config().is_none());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let res = Args::try_parse_from(["manus", "--fonds-id", "1", "--workers", "0"]);
        assert!(res.is_err());
    }

    #[test]
    fn verbose_raises_log_level() {
        let args = Args::try_parse_from(["manus", "-v"]).unwrap();
        assert_eq!(args.log_filter(), "manus=info");
    }
}
