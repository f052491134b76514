use crate::error::SigningError;

/// Derives the verification method used for signing from a DID that carries no document of its own.
pub trait VerificationMethodStrategy: Send + Sync {
    fn verification_method(&self, did: &str) -> Result<String, SigningError>;
}

/// `did:key` DIDs reference their key by its fingerprint, any other DID by `#key-1`. Unqualified DIDs are treated as
/// `did:sov` identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultVerificationMethod;

impl VerificationMethodStrategy for DefaultVerificationMethod {
    fn verification_method(&self, did: &str) -> Result<String, SigningError> {
        if did.is_empty() {
            return Err(SigningError::MissingVerificationMethod);
        }

        Ok(match did.strip_prefix("did:key:") {
            Some(fingerprint) => format!("{did}#{fingerprint}"),
            None if did.starts_with("did:") => format!("{did}#key-1"),
            None => format!("did:sov:{did}#key-1"),
        })
    }
}
