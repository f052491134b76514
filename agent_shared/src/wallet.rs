use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SharedError;

/// A DID as recorded in the host's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidInfo {
    pub did: String,
    pub verkey: String,
    #[serde(default)]
    pub metadata: Value,
    pub method: String,
    pub key_type: String,
}

/// The part of the host's wallet this plugin writes to.
#[async_trait]
pub trait Wallet: Send + Sync {
    async fn store_did(&self, did_info: DidInfo) -> Result<DidInfo, SharedError>;
}

#[cfg(feature = "test_utils")]
pub mod in_memory {
    use super::*;
    use std::sync::Mutex;

    /// Keeps stored DIDs in memory.
    #[derive(Default)]
    pub struct InMemoryWallet {
        dids: Mutex<Vec<DidInfo>>,
    }

    impl InMemoryWallet {
        pub fn dids(&self) -> Vec<DidInfo> {
            self.dids.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Wallet for InMemoryWallet {
        async fn store_did(&self, did_info: DidInfo) -> Result<DidInfo, SharedError> {
            let mut dids = self
                .dids
                .lock()
                .map_err(|err| SharedError::Wallet(err.to_string()))?;

            if dids.iter().any(|stored| stored.did == did_info.did) {
                return Err(SharedError::Wallet(format!("DID already exists: {}", did_info.did)));
            }

            dids.push(did_info.clone());

            Ok(did_info)
        }
    }

}
