use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key algorithms the KMS can generate.
/// ```
/// use agent_kms::key::KeyAlg;
/// use serde_json::json;
///
/// let alg: KeyAlg = serde_json::from_value(json!("bls12-381g2")).unwrap();
/// assert_eq!(alg, KeyAlg::Bls12381G2);
/// assert_eq!(alg.to_string(), "bls12-381g2");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum KeyAlg {
    Ed25519,
    X25519,
    P256,
    P384,
    P521,
    Secp256k1,
    #[serde(rename = "bls12-381g1")]
    #[strum(serialize = "bls12-381g1")]
    Bls12381G1,
    #[serde(rename = "bls12-381g2")]
    #[strum(serialize = "bls12-381g2")]
    Bls12381G2,
}

/// A key held by the KMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub kid: String,
    pub jwk: Value,
    pub b58: String,
}

/// Confirmation that an alias now refers to a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociateResult {
    pub kid: String,
    pub wallet_id: String,
    pub alias: String,
}

#[derive(Serialize)]
pub(crate) struct GenerateKeyRequest {
    pub alg: KeyAlg,
}

#[derive(Serialize)]
pub(crate) struct AssociateKeyRequest<'a> {
    pub alias: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SignRequest<'a> {
    pub kid: &'a str,
    pub data: String,
}

#[derive(Deserialize)]
pub(crate) struct SignResponse {
    pub sig: String,
}
