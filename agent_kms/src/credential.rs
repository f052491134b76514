use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::collections::HashMap;

/// A verifiable credential together with the metadata the KMS indexes it by.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VcRecord {
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(default)]
    pub expanded_types: Vec<String>,
    #[serde(default)]
    pub schema_ids: Vec<String>,
    pub issuer_id: Option<String>,
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub proof_types: Vec<String>,
    #[serde(default)]
    pub cred_value: Value,
    pub given_id: Option<String>,
    #[serde(default)]
    pub cred_tags: HashMap<String, String>,
    pub record_id: Option<String>,
}

impl VcRecord {
    /// Builds a record from a JSON-LD credential, reading the indexed fields from the document itself. The
    /// credential's `id`, when present, becomes the `given_id`.
    /// ```
    /// use agent_kms::credential::VcRecord;
    /// use serde_json::json;
    ///
    /// let record = VcRecord::from_credential(json!({
    ///     "@context": ["https://www.w3.org/2018/credentials/v1"],
    ///     "id": "urn:uuid:0001",
    ///     "type": ["VerifiableCredential"],
    ///     "issuer": {"id": "did:example:issuer"},
    ///     "credentialSubject": {"id": "did:example:bob"},
    ///     "proof": {"type": "Ed25519Signature2020"}
    /// }));
    ///
    /// assert_eq!(record.given_id.as_deref(), Some("urn:uuid:0001"));
    /// assert_eq!(record.issuer_id.as_deref(), Some("did:example:issuer"));
    /// assert_eq!(record.subject_ids, vec!["did:example:bob"]);
    /// assert_eq!(record.proof_types, vec!["Ed25519Signature2020"]);
    /// ```
    pub fn from_credential(credential: Value) -> Self {
        let issuer_id = match credential.get("issuer") {
            Some(Value::String(issuer)) => Some(issuer.clone()),
            Some(issuer) => issuer.get("id").and_then(Value::as_str).map(ToString::to_string),
            None => None,
        };

        VcRecord {
            contexts: one_or_many(credential.get("@context"), |context| context.as_str()),
            expanded_types: one_or_many(credential.get("type"), Value::as_str),
            schema_ids: one_or_many(credential.get("credentialSchema"), |schema| {
                schema.get("id").and_then(Value::as_str)
            }),
            issuer_id,
            subject_ids: one_or_many(credential.get("credentialSubject"), |subject| {
                subject.get("id").and_then(Value::as_str)
            }),
            proof_types: one_or_many(credential.get("proof"), |proof| proof.get("type").and_then(Value::as_str)),
            given_id: credential.get("id").and_then(Value::as_str).map(ToString::to_string),
            cred_value: credential,
            cred_tags: HashMap::new(),
            record_id: None,
        }
    }
}

/// Collects `extract` over a JSON-LD value that may be a single item or an array of items.
fn one_or_many<'a, F>(value: Option<&'a Value>, extract: F) -> Vec<String>
where
    F: Fn(&'a Value) -> Option<&'a str>,
{
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(&extract).map(ToString::to_string).collect(),
        Some(item) => extract(item).map(ToString::to_string).into_iter().collect(),
        None => vec![],
    }
}

/// Conditions a credential search must satisfy. Unset fields are left out of the request.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialFilter {
    pub contexts: Option<Vec<String>>,
    pub types: Option<Vec<String>>,
    pub schema_ids: Option<Vec<String>>,
    pub issuer_id: Option<String>,
    pub subject_ids: Option<Vec<String>>,
    pub proof_types: Option<Vec<String>>,
    pub given_id: Option<String>,
    pub tag_query: Option<Value>,
    pub pd_uri_list: Option<Vec<String>>,
}

#[derive(Serialize)]
pub(crate) struct SearchRequest<'a> {
    #[serde(flatten)]
    pub filter: &'a CredentialFilter,
    pub offset: usize,
    pub limit: usize,
}

#[derive(Deserialize)]
pub(crate) struct SearchResponse {
    pub records: Vec<VcRecord>,
}

#[derive(Deserialize)]
pub(crate) struct StoreResponse {
    pub record_id: String,
}
