use agent_shared::UrlAppendHelpers;
use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    credential::{CredentialFilter, SearchRequest, SearchResponse, StoreResponse, VcRecord},
    error::KmsError,
    key::{AssociateKeyRequest, AssociateResult, GenerateKeyRequest, KeyAlg, KeyResult, SignRequest, SignResponse},
};

/// Header that selects the KMS profile a request operates in.
pub const PROFILE_HEADER: &str = "X-Profile";

/// Header value used when a client is not scoped to a profile.
pub const DEFAULT_PROFILE: &str = "default";

/// Decodes base64url with or without padding.
const URL_SAFE_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Selects the profile of a derived client view, see [`KmsClient::with_profile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileScope {
    /// Keep the receiver's profile.
    #[default]
    Inherit,
    /// Drop any profile; requests use [`DEFAULT_PROFILE`].
    Default,
    /// Scope requests to the named profile.
    Named(String),
}

impl From<Option<String>> for ProfileScope {
    fn from(profile: Option<String>) -> Self {
        profile.map_or(ProfileScope::Default, ProfileScope::Named)
    }
}

/// Client for the mini-KMS HTTP API.
///
/// Cloning is cheap: clones and the views returned by [`KmsClient::with_profile`] share one connection pool.
#[derive(Debug, Clone)]
pub struct KmsClient {
    base_url: Url,
    profile: Option<String>,
    client: reqwest::Client,
}

impl KmsClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: Url, client: reqwest::Client) -> Self {
        Self {
            base_url,
            profile: None,
            client,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Returns a view of this client scoped according to `scope`. The receiver is left untouched.
    pub fn with_profile(&self, scope: ProfileScope) -> Self {
        let profile = match scope {
            ProfileScope::Inherit => self.profile.clone(),
            ProfileScope::Default => None,
            ProfileScope::Named(profile) => Some(profile),
        };

        Self {
            base_url: self.base_url.clone(),
            profile,
            client: self.client.clone(),
        }
    }

    /// The value sent in the [`PROFILE_HEADER`] of every request.
    pub fn profile_header(&self) -> &str {
        self.profile
            .as_deref()
            .filter(|profile| !profile.is_empty())
            .unwrap_or(DEFAULT_PROFILE)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {url} ({PROFILE_HEADER}: {})", self.profile_header());

        self.client
            .request(method, url)
            .header(PROFILE_HEADER, self.profile_header())
    }

    async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response, KmsError> {
        let response = request
            .send()
            .await
            .map_err(|source| KmsError::Request { operation, source })?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(KmsError::from_response(operation, response).await)
        }
    }

    async fn json<T: DeserializeOwned>(operation: &'static str, response: Response) -> Result<T, KmsError> {
        response
            .json()
            .await
            .map_err(|source| KmsError::Request { operation, source })
    }

    /// Creates `profile` on the KMS. A profile that already exists is not an error.
    pub async fn create_profile_if_not_exists(&self, profile: &str) -> Result<(), KmsError> {
        const OPERATION: &str = "creating profile";

        info!("Creating profile `{profile}`");

        let request = self
            .request(Method::POST, self.base_url.add_path("/profile")?)
            .json(&json!({ "name": profile }));

        match Self::send(OPERATION, request).await {
            Ok(response) => {
                let body: Value = Self::json(OPERATION, response).await?;

                if body.get("success") == Some(&Value::Bool(true)) {
                    Ok(())
                } else {
                    Err(KmsError::UnknownProfileError)
                }
            }
            Err(err) if err.is_profile_already_exists() => {
                warn!("Profile `{profile}` already exists");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub async fn generate_key(&self, alg: KeyAlg) -> Result<KeyResult, KmsError> {
        const OPERATION: &str = "generating key";

        info!("Generating `{alg}` key in profile `{}`", self.profile_header());

        let request = self
            .request(Method::POST, self.base_url.add_path("/key/generate")?)
            .json(&GenerateKeyRequest { alg });

        let response = Self::send(OPERATION, request).await?;
        Self::json(OPERATION, response).await
    }

    /// Makes the key `kid` retrievable through `alias`.
    pub async fn associate_key(&self, kid: &str, alias: &str) -> Result<AssociateResult, KmsError> {
        const OPERATION: &str = "associating key";

        info!("Associating key `{kid}` with alias `{alias}`");

        let url = self.base_url.add_path("/key")?.add_segment(kid)?.add_path("associate")?;
        let request = self.request(Method::POST, url).json(&AssociateKeyRequest { alias });

        let response = Self::send(OPERATION, request).await?;
        Self::json(OPERATION, response).await
    }

    pub async fn get_key_by_alias(&self, alias: &str) -> Result<KeyResult, KmsError> {
        const OPERATION: &str = "retrieving key";

        debug!("Retrieving key by alias `{alias}`");

        let request = self
            .request(Method::GET, self.base_url.add_path("/key")?)
            .query(&[("alias", alias)]);

        let response = Self::send(OPERATION, request).await?;
        Self::json(OPERATION, response).await
    }

    /// Signs `data` with the key `kid`. The key never leaves the KMS.
    pub async fn sign(&self, kid: &str, data: &[u8]) -> Result<Vec<u8>, KmsError> {
        const OPERATION: &str = "signing message";

        info!("Signing {} bytes with key `{kid}`", data.len());

        let request = self
            .request(Method::POST, self.base_url.add_path("/sign")?)
            .json(&SignRequest {
                kid,
                data: URL_SAFE.encode(data),
            });

        let response = Self::send(OPERATION, request).await?;
        let SignResponse { sig } = Self::json(OPERATION, response).await?;

        URL_SAFE_INDIFFERENT.decode(sig).map_err(Into::into)
    }

    /// Stores `record` and returns the record id assigned by the KMS.
    pub async fn store_credential(&self, record: &VcRecord) -> Result<String, KmsError> {
        const OPERATION: &str = "storing credential";

        info!("Storing credential in profile `{}`", self.profile_header());

        let request = self
            .request(Method::POST, self.base_url.add_path("/vc-holder/store")?)
            .json(record);

        let response = Self::send(OPERATION, request).await?;
        let StoreResponse { record_id } = Self::json(OPERATION, response).await?;

        debug!("Stored credential as record `{record_id}`");

        Ok(record_id)
    }

    pub async fn retrieve_credential_by_id(&self, record_id: &str) -> Result<VcRecord, KmsError> {
        const OPERATION: &str = "retrieving credential";

        let url = self
            .base_url
            .add_path("/vc-holder/credential/record")?
            .add_segment(record_id)?;

        let response = Self::send(OPERATION, self.request(Method::GET, url)).await?;
        Self::json(OPERATION, response).await
    }

    pub async fn retrieve_credential_by_given_id(&self, given_id: &str) -> Result<VcRecord, KmsError> {
        const OPERATION: &str = "retrieving credential";

        let url = self
            .base_url
            .add_path("/vc-holder/credential/given")?
            .add_segment(given_id)?;

        let response = Self::send(OPERATION, self.request(Method::GET, url)).await?;
        Self::json(OPERATION, response).await
    }

    pub async fn delete_credential(&self, record_id: &str) -> Result<(), KmsError> {
        const OPERATION: &str = "deleting credential";

        info!("Deleting credential record `{record_id}`");

        let url = self
            .base_url
            .add_path("/vc-holder/credential/record")?
            .add_segment(record_id)?;

        Self::send(OPERATION, self.request(Method::DELETE, url)).await?;

        Ok(())
    }

    /// Returns at most `limit` records matching `filter`, skipping the first `offset` matches.
    pub async fn search_credentials(
        &self,
        filter: &CredentialFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<VcRecord>, KmsError> {
        const OPERATION: &str = "searching credentials";

        debug!("Searching credentials (offset: {offset}, limit: {limit})");

        let request = self
            .request(Method::POST, self.base_url.add_path("/vc-holder/credentials")?)
            .json(&SearchRequest { filter, offset, limit });

        let response = Self::send(OPERATION, request).await?;
        let SearchResponse { records } = Self::json(OPERATION, response).await?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KmsClient {
        KmsClient::new("http://kms.local".parse().unwrap())
    }

    #[test]
    fn unscoped_client_uses_the_default_profile() {
        let kms = client();

        assert_eq!(kms.profile(), None);
        assert_eq!(kms.profile_header(), DEFAULT_PROFILE);
    }

    #[test]
    fn with_profile_returns_a_new_view() {
        let kms = client();
        let scoped = kms.with_profile(ProfileScope::Named("wallet-0001".to_string()));

        assert_eq!(scoped.profile_header(), "wallet-0001");
        assert_eq!(kms.profile_header(), DEFAULT_PROFILE);
        assert_eq!(scoped.base_url(), kms.base_url());
    }

    #[test]
    fn with_profile_distinguishes_inherit_from_default() {
        let scoped = client().with_profile(ProfileScope::Named("wallet-0001".to_string()));

        assert_eq!(scoped.with_profile(ProfileScope::Inherit).profile(), Some("wallet-0001"));
        assert_eq!(scoped.with_profile(ProfileScope::Default).profile(), None);
        assert_eq!(
            scoped.with_profile(ProfileScope::Named("wallet-0002".to_string())).profile(),
            Some("wallet-0002")
        );
        assert_eq!(scoped.profile(), Some("wallet-0001"));
    }

    #[test]
    fn empty_profile_name_falls_back_to_default() {
        let scoped = client().with_profile(ProfileScope::Named(String::new()));

        assert_eq!(scoped.profile_header(), DEFAULT_PROFILE);
    }

    #[test]
    fn optional_profile_converts_to_scope() {
        assert_eq!(ProfileScope::from(None), ProfileScope::Default);
        assert_eq!(
            ProfileScope::from(Some("wallet-0001".to_string())),
            ProfileScope::Named("wallet-0001".to_string())
        );
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn transport_errors_name_the_operation() {
        // Nothing listens on port 9 of localhost.
        let kms = KmsClient::new("http://127.0.0.1:9".parse().unwrap());

        let error = kms.generate_key(KeyAlg::Ed25519).await.unwrap_err();

        assert!(matches!(error, KmsError::Request { operation: "generating key", .. }));
        assert!(logs_contain("Generating `ed25519` key in profile `default`"));
    }
}
