use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// A linked data proof, as embedded in a credential's `proof` member.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub proof_purpose: String,
    #[serde(default)]
    pub verification_method: String,
    pub created: Option<String>,
    pub challenge: Option<String>,
    pub domain: Option<String>,
    pub proof_value: Option<String>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}
