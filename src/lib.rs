//! Harvester for the TEI XML encodings of every record in a Manus Online fonds.
//!
//! Walks the fonds' listing pages one at a time, collects record identifiers and
//! downloads each record's XML on a bounded pool of workers.

pub mod config;
mod download;
mod error;
mod macros;
mod parse;
pub mod process;
mod progress;
mod request;

pub use download::{DownloadOutcome, DownloadTask, RecordDownloader};
pub use error::{Error, Result};
pub use parse::{PageDescriptor, RecordId, RecordMetadata};
pub use progress::ProgressReporter;
pub use request::CatalogClient;

pub const BASE_URL: &str = "https://manus.iccu.sbn.it";
const LISTING_PATH: &str = "opac_ElencoSchedeDiUnFondo.php";
const DETAIL_PATH: &str = "opac_SchedaScheda.php";
const INTERSTITIAL_PATH: &str = "Backoffice/XML/index_immediato.php";
/// Operation tag the interstitial endpoint expects for a manuscript record.
const INTERSTITIAL_OP: &str = "manos";
pub const OUTPUT_DIR: &str = "manus-data";
pub const WORKERS: usize = 8;
