use agent_kms::KmsClient;
use async_trait::async_trait;
use tracing::info;

use crate::{error::SigningError, multibase, proof::Proof};

pub const ED25519_SIGNATURE_2020: &str = "Ed25519Signature2020";

/// Signs and verifies linked data proofs of a single proof type.
#[async_trait]
pub trait LinkedDataSignature: Send + Sync {
    fn signature_type(&self) -> &str;

    fn verification_method(&self) -> &str;

    /// The proof template the suite was created with, if any.
    fn proof(&self) -> Option<&Proof>;

    /// Signs the canonicalized `data` and returns `proof` with its signature filled in.
    async fn sign(&self, data: &[u8], proof: Proof) -> Result<Proof, SigningError>;

    async fn verify(&self, data: &[u8], proof: &Proof) -> Result<bool, SigningError>;
}

/// `Ed25519Signature2020` proofs signed by a key held in the KMS. The key is looked up through its alias, which is the
/// verification method.
pub struct KmsEd25519Signature2020 {
    kms: KmsClient,
    verification_method: String,
    proof: Option<Proof>,
}

impl KmsEd25519Signature2020 {
    pub fn new(kms: KmsClient, verification_method: String, proof: Option<Proof>) -> Self {
        Self {
            kms,
            verification_method,
            proof,
        }
    }

    pub fn kms(&self) -> &KmsClient {
        &self.kms
    }
}

#[async_trait]
impl LinkedDataSignature for KmsEd25519Signature2020 {
    fn signature_type(&self) -> &str {
        ED25519_SIGNATURE_2020
    }

    fn verification_method(&self) -> &str {
        &self.verification_method
    }

    fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    async fn sign(&self, data: &[u8], mut proof: Proof) -> Result<Proof, SigningError> {
        info!("Signing {ED25519_SIGNATURE_2020} proof with `{}`", self.verification_method);

        let key = self.kms.get_key_by_alias(&self.verification_method).await?;
        let signature = self.kms.sign(&key.kid, data).await?;

        proof.proof_value = Some(multibase::encode(&signature));

        Ok(proof)
    }

    async fn verify(&self, _data: &[u8], _proof: &Proof) -> Result<bool, SigningError> {
        Err(SigningError::NotImplemented("Verifying proofs through the KMS"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_kms::{key::KeyAlg, test_utils::FakeKms, ProfileScope};

    const VERIFICATION_METHOD: &str = "did:example:123#key-1";

    fn proof() -> Proof {
        Proof {
            type_: ED25519_SIGNATURE_2020.to_string(),
            proof_purpose: "assertionMethod".to_string(),
            verification_method: VERIFICATION_METHOD.to_string(),
            created: Some("2020-01-01T19:23:24Z".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sign_writes_a_multibase_proof_value() {
        let fake_kms = FakeKms::start().await;
        let kms = fake_kms
            .client()
            .with_profile(ProfileScope::Named("wallet-0001".to_string()));

        let key = kms.generate_key(KeyAlg::Ed25519).await.unwrap();
        kms.associate_key(&key.kid, VERIFICATION_METHOD).await.unwrap();

        let suite = KmsEd25519Signature2020::new(kms, VERIFICATION_METHOD.to_string(), None);
        let signed = suite.sign(b"canonicalized document", proof()).await.unwrap();

        let expected = FakeKms::expected_signature(&key.kid, b"canonicalized document");
        assert_eq!(signed.proof_value, Some(multibase::encode(&expected)));
        assert_eq!(Proof { proof_value: None, ..signed }, proof());
    }

    #[tokio::test]
    async fn sign_fails_for_unknown_verification_methods() {
        let fake_kms = FakeKms::start().await;
        let suite = KmsEd25519Signature2020::new(fake_kms.client(), VERIFICATION_METHOD.to_string(), None);

        assert!(matches!(
            suite.sign(b"data", proof()).await,
            Err(SigningError::Kms(_))
        ));
    }

    #[tokio::test]
    async fn verify_is_not_supported() {
        let fake_kms = FakeKms::start().await;
        let suite = KmsEd25519Signature2020::new(fake_kms.client(), VERIFICATION_METHOD.to_string(), Some(proof()));

        let mut signed = proof();
        signed.proof_value = Some("z3FXQjecWufY46yg5abdVZsXqLhxhueuSoZgNSARiKBk9czhSePTFehP8c3PGfb6a22gkfUKQ7ZiGbFRUSixKYuG".to_string());

        for candidate in [proof(), signed] {
            assert!(matches!(
                suite.verify(b"data", &candidate).await,
                Err(SigningError::NotImplemented(_))
            ));
        }
        assert!(fake_kms.server.received_requests().await.unwrap().is_empty());
        assert_eq!(suite.signature_type(), ED25519_SIGNATURE_2020);
        assert_eq!(suite.proof(), Some(&proof()));
    }
}
