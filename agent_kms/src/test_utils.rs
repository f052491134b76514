//! A stateful stand-in for the mini-KMS, served by a [`wiremock::MockServer`].

use base64::{engine::general_purpose::URL_SAFE, Engine};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use url::Url;
use wiremock::{
    matchers::{method, path, path_regex},
    Mock, MockServer, Request, ResponseTemplate,
};

use crate::{
    client::{KmsClient, DEFAULT_PROFILE, PROFILE_HEADER},
    credential::{CredentialFilter, VcRecord},
    key::{KeyAlg, KeyResult},
};

#[derive(Default)]
struct FakeKmsState {
    profiles: Vec<String>,
    /// Keys per profile.
    keys: HashMap<String, Vec<KeyResult>>,
    /// `(profile, alias)` to `kid`.
    aliases: HashMap<(String, String), String>,
    /// Credential records per profile, in insertion order.
    records: HashMap<String, Vec<VcRecord>>,
    counter: usize,
}

impl FakeKmsState {
    fn next_id(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    fn key(&self, profile: &str, kid: &str) -> Option<&KeyResult> {
        self.keys.get(profile)?.iter().find(|key| key.kid == kid)
    }
}

/// A fake KMS that keeps keys and credential records in memory, isolated per `X-Profile`.
pub struct FakeKms {
    pub server: MockServer,
    state: Arc<Mutex<FakeKmsState>>,
}

fn profile(request: &Request) -> String {
    request
        .headers
        .get(PROFILE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_PROFILE)
        .to_string()
}

fn not_found(detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({ "detail": detail }))
}

fn bad_request(detail: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "detail": detail }))
}

/// The percent-decoded path segment at `index`, e.g. the kid of `/key/{kid}/associate`.
fn segment(request: &Request, index: usize) -> String {
    request
        .url
        .path_segments()
        .and_then(|mut segments| segments.nth(index))
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .unwrap_or_default()
}

/// The percent-decoded last path segment, e.g. the record id of `/vc-holder/credential/record/{id}`.
fn last_segment(request: &Request) -> String {
    let count = request.url.path_segments().map_or(0, Iterator::count);

    segment(request, count.saturating_sub(1))
}

fn contains_all(values: &[String], required: &Option<Vec<String>>) -> bool {
    required
        .as_ref()
        .map_or(true, |required| required.iter().all(|value| values.contains(value)))
}

fn filter_matches(record: &VcRecord, filter: &CredentialFilter) -> bool {
    contains_all(&record.contexts, &filter.contexts)
        && contains_all(&record.expanded_types, &filter.types)
        && contains_all(&record.schema_ids, &filter.schema_ids)
        && contains_all(&record.subject_ids, &filter.subject_ids)
        && contains_all(&record.proof_types, &filter.proof_types)
        && filter.issuer_id.as_ref().map_or(true, |issuer_id| record.issuer_id.as_ref() == Some(issuer_id))
        && filter.given_id.as_ref().map_or(true, |given_id| record.given_id.as_ref() == Some(given_id))
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(flatten)]
    filter: CredentialFilter,
    offset: usize,
    limit: usize,
}

impl FakeKms {
    pub async fn start() -> Self {
        let fake_kms = FakeKms {
            server: MockServer::start().await,
            state: Default::default(),
        };

        fake_kms.mount().await;

        fake_kms
    }

    pub fn base_url(&self) -> Url {
        self.server.uri().parse().expect("mock server uri should be a valid url")
    }

    /// An unscoped client pointing at this fake.
    pub fn client(&self) -> KmsClient {
        KmsClient::new(self.base_url())
    }

    /// The signature the fake returns for `data` signed with `kid`.
    pub fn expected_signature(kid: &str, data: &[u8]) -> Vec<u8> {
        [kid.as_bytes(), data].concat()
    }

    pub fn profiles(&self) -> Vec<String> {
        self.state.lock().unwrap().profiles.clone()
    }

    /// All records stored in `profile`.
    pub fn records(&self, profile: &str) -> Vec<VcRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(profile)
            .cloned()
            .unwrap_or_default()
    }

    async fn mount(&self) {
        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/profile"))
            .respond_with(move |request: &Request| {
                let name = request.body_json::<Value>().unwrap()["name"].as_str().unwrap().to_string();
                let mut state = state.lock().unwrap();

                if state.profiles.contains(&name) {
                    bad_request(&format!("Profile {name} already exists"))
                } else {
                    state.profiles.push(name);
                    ResponseTemplate::new(200).set_body_json(json!({ "success": true }))
                }
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/key/generate"))
            .respond_with(move |request: &Request| {
                let alg: KeyAlg = serde_json::from_value(request.body_json::<Value>().unwrap()["alg"].clone()).unwrap();
                let mut state = state.lock().unwrap();
                let id = state.next_id();

                let public_key = [id as u8; 32];
                let key = KeyResult {
                    kid: format!("kid-{id}"),
                    jwk: json!({ "kty": "OKP", "crv": alg.to_string(), "x": URL_SAFE.encode(public_key) }),
                    b58: bs58::encode(public_key).into_string(),
                };

                state.keys.entry(profile(request)).or_default().push(key.clone());

                ResponseTemplate::new(200).set_body_json(key)
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path_regex(r"^/key/[^/]+/associate$"))
            .respond_with(move |request: &Request| {
                let kid = segment(request, 1);
                let alias = request.body_json::<Value>().unwrap()["alias"].as_str().unwrap().to_string();
                let profile = profile(request);
                let mut state = state.lock().unwrap();

                if state.key(&profile, &kid).is_none() {
                    return not_found("Key not found");
                }

                state.aliases.insert((profile.clone(), alias.clone()), kid.clone());

                ResponseTemplate::new(200).set_body_json(json!({ "kid": kid, "wallet_id": profile, "alias": alias }))
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("GET"))
            .and(path("/key"))
            .respond_with(move |request: &Request| {
                let alias = request
                    .url
                    .query_pairs()
                    .find(|(key, _)| key == "alias")
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default();
                let profile = profile(request);
                let state = state.lock().unwrap();

                match state
                    .aliases
                    .get(&(profile.clone(), alias))
                    .and_then(|kid| state.key(&profile, kid))
                {
                    Some(key) => ResponseTemplate::new(200).set_body_json(key),
                    None => not_found("Key not found"),
                }
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/sign"))
            .respond_with(move |request: &Request| {
                let body: Value = request.body_json().unwrap();
                let kid = body["kid"].as_str().unwrap();
                let state = state.lock().unwrap();

                if state.key(&profile(request), kid).is_none() {
                    return not_found("Key not found");
                }

                match URL_SAFE.decode(body["data"].as_str().unwrap()) {
                    Ok(data) => ResponseTemplate::new(200)
                        .set_body_json(json!({ "sig": URL_SAFE.encode(FakeKms::expected_signature(kid, &data)) })),
                    Err(_) => bad_request("Invalid data"),
                }
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/vc-holder/store"))
            .respond_with(move |request: &Request| {
                let mut record: VcRecord = request.body_json().unwrap();
                let mut state = state.lock().unwrap();
                let record_id = format!("record-{}", state.next_id());

                record.record_id = Some(record_id.clone());
                state.records.entry(profile(request)).or_default().push(record);

                ResponseTemplate::new(200).set_body_json(json!({ "record_id": record_id }))
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("GET"))
            .and(path_regex(r"^/vc-holder/credential/record/[^/]+$"))
            .respond_with(move |request: &Request| {
                let record_id = last_segment(request);
                let state = state.lock().unwrap();

                state
                    .records
                    .get(&profile(request))
                    .and_then(|records| records.iter().find(|record| record.record_id.as_ref() == Some(&record_id)))
                    .map_or_else(
                        || not_found("Record not found"),
                        |record| ResponseTemplate::new(200).set_body_json(record),
                    )
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("GET"))
            .and(path_regex(r"^/vc-holder/credential/given/[^/]+$"))
            .respond_with(move |request: &Request| {
                let given_id = last_segment(request);
                let state = state.lock().unwrap();

                state
                    .records
                    .get(&profile(request))
                    .and_then(|records| records.iter().find(|record| record.given_id.as_ref() == Some(&given_id)))
                    .map_or_else(
                        || not_found("Record not found"),
                        |record| ResponseTemplate::new(200).set_body_json(record),
                    )
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("DELETE"))
            .and(path_regex(r"^/vc-holder/credential/record/[^/]+$"))
            .respond_with(move |request: &Request| {
                let record_id = last_segment(request);
                let mut state = state.lock().unwrap();
                let records = state.records.entry(profile(request)).or_default();

                match records.iter().position(|record| record.record_id.as_ref() == Some(&record_id)) {
                    Some(index) => {
                        records.remove(index);
                        ResponseTemplate::new(200).set_body_json(json!({}))
                    }
                    None => not_found("Record not found"),
                }
            })
            .mount(&self.server)
            .await;

        let state = self.state.clone();
        Mock::given(method("POST"))
            .and(path("/vc-holder/credentials"))
            .respond_with(move |request: &Request| {
                let SearchBody { filter, offset, limit } = request.body_json().unwrap();
                let state = state.lock().unwrap();

                let records: Vec<&VcRecord> = state
                    .records
                    .get(&profile(request))
                    .map(|records| {
                        records
                            .iter()
                            .filter(|record| filter_matches(record, &filter))
                            .skip(offset)
                            .take(limit)
                            .collect()
                    })
                    .unwrap_or_default();

                ResponseTemplate::new(200).set_body_json(json!({ "records": records }))
            })
            .mount(&self.server)
            .await;
    }
}
