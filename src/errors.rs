use thiserror::Error;
use std::num::{ParseFloatError, ParseIntError};

#[derive(Error, Debug)]
pub enum SectorHubError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Parse int error: {0}")]
    ParseIntError(#[from] ParseIntError),

    #[error("Parse float error: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    #[error("Invalid selector `{0}`")]
    SelectorError(String),

    #[error("Hit {count} consecutive 503 errors (last symbol {symbol}). Check whether the price API is still online.")]
    ServiceUnavailable { symbol: String, count: u32 },

    #[error("Profile page for {symbol} could not be fetched: {message}")]
    ProfileUnavailable { symbol: String, message: String },

    #[error("{0}")]
    EmptyInput(String),

    #[error("Sector {sector} has a zero baseline value, analysis cannot continue")]
    DegenerateBaseline { sector: String },

    #[error("Need {needed} trading days of history but only {available} are available")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("The file {0} is locked. Please unlock or close the file before rerunning.")]
    FileLocked(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl SectorHubError {
    /// 是否为需要终止整个运行的错误
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SectorHubError::ServiceUnavailable { .. }
                | SectorHubError::ProfileUnavailable { .. }
                | SectorHubError::EmptyInput(_)
                | SectorHubError::DegenerateBaseline { .. }
                | SectorHubError::InsufficientHistory { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SectorHubError>;

// 用于从字符串创建错误
impl From<String> for SectorHubError {
    fn from(s: String) -> Self {
        SectorHubError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for SectorHubError {
    fn from(s: &str) -> Self {
        SectorHubError::Unknown(s.to_string())
    }
}
