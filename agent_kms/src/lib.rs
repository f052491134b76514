pub mod client;
pub mod credential;
pub mod error;
pub mod key;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub use client::{KmsClient, ProfileScope};
pub use error::KmsError;
