use agent_kms::KmsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SigningError {
    #[error("Unsupported proof type: {0}")]
    UnsupportedProofType(String),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    #[error("No verification method given and no DID to derive one from")]
    MissingVerificationMethod,
    #[error("DID document of `{0}` has no assertion method")]
    NoAssertionMethod(String),
    #[error(transparent)]
    DidPeer(#[from] DidPeerError),
    #[error(transparent)]
    Kms(#[from] KmsError),
}

#[derive(Error, Debug, PartialEq)]
pub enum DidPeerError {
    #[error("Not a did:peer:4 DID: `{0}`")]
    NotPeer4(String),
    #[error("Short form did:peer:4 DIDs cannot be resolved: `{0}`")]
    ShortForm(String),
    #[error("Hash does not match the encoded document")]
    HashMismatch,
    #[error("Invalid multibase value: `{0}`")]
    InvalidMultibase(String),
    #[error("Encoded document is not multicodec JSON")]
    NotJson,
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
