use agent_kms::{key::KeyAlg, KmsError};
use agent_shared::{error::SharedError, wallet::DidInfo};
use agent_signing::{did_peer4, error::DidPeerError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::{ext::internal_server_error, ExtState};

pub const DID_PEER_4: &str = did_peer4::PREFIX;
pub const ED25519: &str = "ed25519";

#[derive(Debug, Serialize)]
pub struct CreateDidResponse {
    pub did: String,
    pub verkey: String,
    pub posture: &'static str,
    pub method: String,
    pub key_type: String,
}

impl From<DidInfo> for CreateDidResponse {
    fn from(did_info: DidInfo) -> Self {
        Self {
            did: did_info.did,
            verkey: did_info.verkey,
            posture: "wallet_only",
            method: did_info.method,
            key_type: did_info.key_type,
        }
    }
}

/// Creates a `did:peer:4` DID for a fresh ed25519 key held in the profile's KMS profile.
#[axum_macros::debug_handler]
pub(crate) async fn create(State(state): State<ExtState>) -> Response {
    match create_did(&state).await {
        Ok(did_info) => (StatusCode::OK, Json(CreateDidResponse::from(did_info))).into_response(),
        Err(err) => {
            error!("Failed to create DID: {err}");
            internal_server_error(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum CreateDidError {
    #[error(transparent)]
    Kms(#[from] KmsError),
    #[error("Invalid public key `{0}`")]
    InvalidPublicKey(String),
    #[error(transparent)]
    DidPeer(#[from] DidPeerError),
    #[error(transparent)]
    Wallet(#[from] SharedError),
}

async fn create_did(state: &ExtState) -> Result<DidInfo, CreateDidError> {
    let kms = state.scoped_kms();

    let key = kms.generate_key(KeyAlg::Ed25519).await?;
    let public_key = bs58::decode(&key.b58)
        .into_vec()
        .map_err(|_| CreateDidError::InvalidPublicKey(key.b58.clone()))?;

    let did = did_peer4::encode(&did_peer4::ed25519_input_document(&public_key))?;
    kms.associate_key(&key.kid, &format!("{did}{}", did_peer4::KEY_FRAGMENT)).await?;
    info!("Created `{did}` for key `{}` in profile `{}`", key.kid, kms.profile_header());

    let did_info = state
        .wallet
        .store_did(DidInfo {
            did,
            verkey: key.b58,
            metadata: json!({}),
            method: DID_PEER_4.to_string(),
            key_type: ED25519.to_string(),
        })
        .await?;

    Ok(did_info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        router,
        tests::{body_json, ext_state, post},
    };
    use agent_kms::{test_utils::FakeKms, ProfileScope};
    use agent_shared::profile::Profile;
    use agent_signing::{proof::Proof, KmsSuiteProvider, SuiteProvider, ED25519_SIGNATURE_2020};

    #[tokio::test]
    async fn create_stores_a_peer4_did_backed_by_the_kms() {
        let fake_kms = FakeKms::start().await;
        let profile = Profile::with_wallet_id("wallet-0001");
        let (state, wallet) = ext_state(&fake_kms, profile.clone());

        let response = post(router(state), "/ext/did/create").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let did = body["did"].as_str().unwrap().to_string();
        assert!(did.starts_with(DID_PEER_4));
        assert_eq!(body["posture"], json!("wallet_only"));
        assert_eq!(body["method"], json!(DID_PEER_4));
        assert_eq!(body["key_type"], json!(ED25519));

        let stored = wallet.dids();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].did, did);
        assert_eq!(body["verkey"], json!(stored[0].verkey));

        let document = did_peer4::resolve(&did).unwrap();
        let public_key = bs58::decode(&stored[0].verkey).into_vec().unwrap();
        assert_eq!(
            document["verificationMethod"][0]["publicKeyMultibase"],
            did_peer4::ed25519_input_document(&public_key)["verificationMethod"][0]["publicKeyMultibase"]
        );

        // The key is registered in the wallet's KMS profile under the assertion method.
        let alias = format!("{did}{}", did_peer4::KEY_FRAGMENT);
        let scoped = fake_kms
            .client()
            .with_profile(ProfileScope::Named("wallet-0001".to_string()));
        let key = scoped.get_key_by_alias(&alias).await.unwrap();
        assert_eq!(key.b58, stored[0].verkey);

        let suite = KmsSuiteProvider::new(fake_kms.client())
            .get_suite(&profile, ED25519_SIGNATURE_2020, None, None, Some(&stored[0]))
            .unwrap();
        assert_eq!(suite.verification_method(), alias);

        let signed = suite.sign(b"data", Proof::default()).await.unwrap();
        assert_eq!(
            signed.proof_value,
            Some(agent_signing::multibase::encode(&FakeKms::expected_signature(&key.kid, b"data")))
        );
    }

    #[tokio::test]
    async fn create_fails_when_the_kms_fails() {
        let fake_kms = FakeKms::start().await;
        let (state, wallet) = ext_state(&fake_kms, Profile::default());
        fake_kms.server.reset().await;

        let response = post(router(state), "/ext/did/create").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());
        assert!(wallet.dids().is_empty());
    }
}
