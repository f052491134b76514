pub mod did_peer4;
pub mod error;
pub mod multibase;
pub mod proof;
pub mod provider;
pub mod suite;
pub mod verification_method;

pub use error::SigningError;
pub use provider::{KmsSuiteProvider, SuiteProvider};
pub use suite::{KmsEd25519Signature2020, LinkedDataSignature, ED25519_SIGNATURE_2020};
