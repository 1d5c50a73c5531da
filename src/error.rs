use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between issuing the GET for an indicator
/// bundle and having a parsed table in hand. None of these cross the fetch
/// boundary; `fetch::fetch_dataset` logs them and reports a plain miss.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    Status(StatusCode),

    #[error("unreadable archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("reading archive entry: {0}")]
    Io(#[from] std::io::Error),

    #[error("no archive entry starting with `{prefix}`")]
    MissingEntry { prefix: String },

    #[error("archive entry is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),
}
