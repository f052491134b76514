pub mod ext;

use std::sync::Arc;

use agent_kms::{KmsClient, ProfileScope};
use agent_shared::{profile::Profile, wallet::Wallet};
use axum::{routing::post, Router};

/// Everything the admin routes act on: the unscoped KMS client and the host's profile and wallet.
#[derive(Clone)]
pub struct ExtState {
    pub kms: KmsClient,
    pub profile: Profile,
    pub wallet: Arc<dyn Wallet>,
}

impl ExtState {
    /// The KMS client scoped to the profile's `wallet.id`.
    pub fn scoped_kms(&self) -> KmsClient {
        self.kms
            .with_profile(ProfileScope::from(self.profile.wallet_id().map(ToString::to_string)))
    }
}

pub fn router(state: ExtState) -> Router {
    Router::new()
        .route("/ext/profile/setup", post(ext::profile::setup))
        .route("/ext/did/create", post(ext::did::create))
        .with_state(state)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use agent_kms::test_utils::FakeKms;
    use agent_shared::wallet::in_memory::InMemoryWallet;
    use axum::{
        body::Body,
        http::{self, Request, Response},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    pub fn ext_state(fake_kms: &FakeKms, profile: Profile) -> (ExtState, Arc<InMemoryWallet>) {
        let wallet = Arc::new(InMemoryWallet::default());
        let state = ExtState {
            kms: fake_kms.client(),
            profile,
            wallet: wallet.clone(),
        };

        (state, wallet)
    }

    pub async fn post(app: Router, uri: &str) -> Response<Body> {
        app.oneshot(
            Request::builder()
                .method(http::Method::POST)
                .uri(uri)
                .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let fake_kms = FakeKms::start().await;
        let (state, _) = ext_state(&fake_kms, Profile::default());

        let response = post(router(state), "/ext/unknown").await;

        assert_eq!(response.status(), http::StatusCode::NOT_FOUND);
    }
}
