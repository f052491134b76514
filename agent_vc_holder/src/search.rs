use agent_kms::{
    credential::{CredentialFilter, VcRecord},
    KmsClient,
};
use async_trait::async_trait;
use tracing::debug;

use crate::error::VcHolderError;

/// A paged search over credential records.
#[async_trait]
pub trait VcRecordSearch: Send + Sync {
    /// Fetches the next page. `max_count` overrides the page size for this call.
    async fn fetch(&mut self, max_count: Option<usize>) -> Result<Vec<VcRecord>, VcHolderError>;

    /// Releases buffered results. Calling it more than once has no further effect.
    async fn close(&mut self);
}

/// Pages through `POST /vc-holder/credentials` of the KMS.
pub struct KmsVcRecordSearch {
    kms: KmsClient,
    filter: CredentialFilter,
    page_size: usize,
    offset: usize,
    results: Vec<VcRecord>,
    closed: bool,
}

impl KmsVcRecordSearch {
    pub fn new(kms: KmsClient, filter: CredentialFilter, page_size: usize) -> Self {
        Self {
            kms,
            filter,
            page_size,
            offset: 0,
            results: vec![],
            closed: false,
        }
    }

    pub fn filter(&self) -> &CredentialFilter {
        &self.filter
    }

    /// The offset the next `fetch` starts at.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Every record fetched since the search was opened.
    pub fn results(&self) -> &[VcRecord] {
        &self.results
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl VcRecordSearch for KmsVcRecordSearch {
    async fn fetch(&mut self, max_count: Option<usize>) -> Result<Vec<VcRecord>, VcHolderError> {
        if self.closed {
            return Err(VcHolderError::SearchClosed);
        }

        let limit = max_count.filter(|max_count| *max_count > 0).unwrap_or(self.page_size);

        let records = self.kms.search_credentials(&self.filter, self.offset, limit).await?;

        // The next page starts at the last record of this one, so consecutive pages share one record.
        self.offset = (self.offset + records.len()).saturating_sub(1);
        self.results.extend(records.iter().cloned());

        debug!("Fetched {} credential records, next offset: {}", records.len(), self.offset);

        Ok(records)
    }

    async fn close(&mut self) {
        self.results.clear();
        self.closed = true;
    }
}
