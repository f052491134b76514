use std::sync::Arc;

use agent_kms::{KmsClient, ProfileScope};
use agent_shared::{profile::Profile, wallet::DidInfo};
use tracing::{debug, info};

use crate::{
    did_peer4,
    error::SigningError,
    proof::Proof,
    suite::{KmsEd25519Signature2020, LinkedDataSignature, ED25519_SIGNATURE_2020},
    verification_method::{DefaultVerificationMethod, VerificationMethodStrategy},
};

/// Hands out signature suites for a host profile.
pub trait SuiteProvider: Send + Sync {
    fn get_suite(
        &self,
        profile: &Profile,
        proof_type: &str,
        proof: Option<Proof>,
        verification_method: Option<&str>,
        did_info: Option<&DidInfo>,
    ) -> Result<Box<dyn LinkedDataSignature>, SigningError>;
}

/// Provides suites whose keys live in the KMS, scoped to the profile's `wallet.id`.
#[derive(Clone)]
pub struct KmsSuiteProvider {
    kms: KmsClient,
    strategy: Arc<dyn VerificationMethodStrategy>,
}

impl KmsSuiteProvider {
    pub fn new(kms: KmsClient) -> Self {
        Self::with_strategy(kms, Arc::new(DefaultVerificationMethod))
    }

    pub fn with_strategy(kms: KmsClient, strategy: Arc<dyn VerificationMethodStrategy>) -> Self {
        Self { kms, strategy }
    }

    /// The verification method signing on behalf of `did`.
    pub fn verification_method_for(&self, did: &str) -> Result<String, SigningError> {
        if !did_peer4::is_peer4(did) {
            return self.strategy.verification_method(did);
        }

        let document = did_peer4::resolve(did)?;

        did_peer4::first_assertion_method(&document).ok_or_else(|| SigningError::NoAssertionMethod(did.to_string()))
    }
}

impl SuiteProvider for KmsSuiteProvider {
    fn get_suite(
        &self,
        profile: &Profile,
        proof_type: &str,
        proof: Option<Proof>,
        verification_method: Option<&str>,
        did_info: Option<&DidInfo>,
    ) -> Result<Box<dyn LinkedDataSignature>, SigningError> {
        if proof_type != ED25519_SIGNATURE_2020 {
            return Err(SigningError::UnsupportedProofType(proof_type.to_string()));
        }

        let verification_method = match (verification_method, did_info) {
            (Some(verification_method), _) => verification_method.to_string(),
            (None, Some(did_info)) => self.verification_method_for(&did_info.did)?,
            (None, None) => return Err(SigningError::MissingVerificationMethod),
        };
        debug!("Using verification method `{verification_method}`");

        let kms = self
            .kms
            .with_profile(ProfileScope::from(profile.wallet_id().map(ToString::to_string)));
        info!("Providing {proof_type} suite for profile `{}`", kms.profile_header());

        Ok(Box::new(KmsEd25519Signature2020::new(kms, verification_method, proof)))
    }
}
