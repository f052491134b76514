use agent_kms::{
    credential::{CredentialFilter, VcRecord},
    KmsClient, ProfileScope,
};
use agent_shared::{config::DEFAULT_SEARCH_PAGE_SIZE, profile::Profile};
use async_trait::async_trait;
use tracing::info;

use crate::{
    error::VcHolderError,
    search::{KmsVcRecordSearch, VcRecordSearch},
};

/// Storage of credential records on behalf of one wallet.
#[async_trait]
pub trait VcHolder: Send + Sync {
    /// Stores `credential` and returns its record id.
    async fn store_credential(&self, credential: &VcRecord) -> Result<String, VcHolderError>;

    async fn retrieve_credential_by_id(&self, record_id: &str) -> Result<VcRecord, VcHolderError>;

    async fn retrieve_credential_by_given_id(&self, given_id: &str) -> Result<VcRecord, VcHolderError>;

    async fn delete_credential(&self, credential: &VcRecord) -> Result<(), VcHolderError>;

    fn search_credentials(&self, filter: CredentialFilter) -> Box<dyn VcRecordSearch>;
}

/// Keeps credential records in the KMS, inside the profile named after the wallet.
pub struct KmsVcHolder {
    kms: KmsClient,
    page_size: usize,
}

impl KmsVcHolder {
    pub fn new(profile: &Profile, kms: &KmsClient) -> Self {
        Self::with_page_size(profile, kms, DEFAULT_SEARCH_PAGE_SIZE)
    }

    pub fn with_page_size(profile: &Profile, kms: &KmsClient, page_size: usize) -> Self {
        let scope = ProfileScope::from(profile.wallet_id().map(ToString::to_string));

        info!("Using external VC holder for wallet {:?}", profile.wallet_id());

        Self {
            kms: kms.with_profile(scope),
            page_size,
        }
    }

    /// The profile-scoped client this holder talks through.
    pub fn kms(&self) -> &KmsClient {
        &self.kms
    }
}

#[async_trait]
impl VcHolder for KmsVcHolder {
    async fn store_credential(&self, credential: &VcRecord) -> Result<String, VcHolderError> {
        Ok(self.kms.store_credential(credential).await?)
    }

    async fn retrieve_credential_by_id(&self, record_id: &str) -> Result<VcRecord, VcHolderError> {
        Ok(self.kms.retrieve_credential_by_id(record_id).await?)
    }

    async fn retrieve_credential_by_given_id(&self, given_id: &str) -> Result<VcRecord, VcHolderError> {
        Ok(self.kms.retrieve_credential_by_given_id(given_id).await?)
    }

    async fn delete_credential(&self, credential: &VcRecord) -> Result<(), VcHolderError> {
        let record_id = credential.record_id.as_deref().ok_or(VcHolderError::MissingRecordId)?;

        Ok(self.kms.delete_credential(record_id).await?)
    }

    fn search_credentials(&self, filter: CredentialFilter) -> Box<dyn VcRecordSearch> {
        Box::new(KmsVcRecordSearch::new(self.kms.clone(), filter, self.page_size))
    }
}
