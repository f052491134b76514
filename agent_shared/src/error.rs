use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("KMS_BASE_URL not set")]
    MissingBaseUrl,
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("KMS_SEARCH_PAGE_SIZE must be at least 1")]
    InvalidSearchPageSize,
    #[error("Cannot append a path to `{0}`")]
    CannotBeABase(url::Url),
    #[error("Wallet error: {0}")]
    Wallet(String),
}
