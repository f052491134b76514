pub mod config;
pub mod error;
pub mod profile;
pub mod url_utils;
pub mod wallet;

pub use url_utils::UrlAppendHelpers;
