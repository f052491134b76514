use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, info};

use crate::{ext::internal_server_error, ExtState};

/// Makes sure the KMS has a profile for the host profile's wallet.
#[axum_macros::debug_handler]
pub(crate) async fn setup(State(state): State<ExtState>) -> Response {
    match state.profile.wallet_id() {
        Some(wallet_id) => {
            if let Err(err) = state.kms.create_profile_if_not_exists(wallet_id).await {
                error!("Failed to set up KMS profile `{wallet_id}`: {err}");
                return internal_server_error(err);
            }
        }
        None => info!("Profile has no `wallet.id`, nothing to set up"),
    }

    (StatusCode::OK, Json(json!({}))).into_response()
}

#[cfg(test)]
mod tests {
    use crate::{
        router,
        tests::{body_json, ext_state, post},
    };
    use agent_kms::test_utils::FakeKms;
    use agent_shared::profile::Profile;
    use axum::http::StatusCode;
    use serde_json::json;
    use tracing_test::traced_test;
    use wiremock::{
        matchers::{method, path},
        Mock, ResponseTemplate,
    };

    #[tokio::test]
    async fn setup_creates_the_wallet_profile_once() {
        let fake_kms = FakeKms::start().await;
        let (state, _) = ext_state(&fake_kms, Profile::with_wallet_id("wallet-0001"));

        for _ in 0..2 {
            let response = post(router(state.clone()), "/ext/profile/setup").await;

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await, json!({}));
        }
        assert_eq!(fake_kms.profiles(), vec!["wallet-0001".to_string()]);
    }

    #[tokio::test]
    async fn setup_without_wallet_id_does_nothing() {
        let fake_kms = FakeKms::start().await;
        let (state, _) = ext_state(&fake_kms, Profile::default());

        let response = post(router(state), "/ext/profile/setup").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(fake_kms.server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn setup_reports_kms_failures() {
        let fake_kms = FakeKms::start().await;
        Mock::given(method("POST"))
            .and(path("/profile"))
            .respond_with(ResponseTemplate::new(503))
            .with_priority(1)
            .mount(&fake_kms.server)
            .await;
        let (state, _) = ext_state(&fake_kms, Profile::with_wallet_id("wallet-0001"));

        let response = post(router(state), "/ext/profile/setup").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("503"));
        assert!(logs_contain("Failed to set up KMS profile `wallet-0001`"));
    }
}
