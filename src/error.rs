use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Network Error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Couldn't find the expected pattern: {0}")]
    Parse(String),
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    Selector(String),

    #[error("Record {id} has no `{field}` field")]
    MissingField { id: String, field: &'static str },
    #[error("Record {id} has an unusable filename: {filename:?}")]
    UnsafeFilename { id: String, filename: String },

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
}
