//! `did:peer:4`: a DID whose document is carried inside the identifier itself.
//!
//! The long form is `did:peer:4<hash>:<encoded document>`, where the encoded document is the base58btc multibase of
//! the multicodec-prefixed JSON input document and the hash is the base58btc multibase of the sha2-256 multihash of
//! the encoded document. The short form drops `:<encoded document>`.

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::{error::DidPeerError, multibase};

pub const PREFIX: &str = "did:peer:4";

/// Fragment of the single verification method in documents built by [`ed25519_input_document`].
pub const KEY_FRAGMENT: &str = "#key-0";

const MULTICODEC_JSON: [u8; 2] = [0x80, 0x04];
const MULTICODEC_ED25519_PUB: [u8; 2] = [0xed, 0x01];
const MULTIHASH_SHA2_256: [u8; 2] = [0x12, 0x20];

const RELATIONSHIPS: [&str; 5] = [
    "authentication",
    "assertionMethod",
    "keyAgreement",
    "capabilityInvocation",
    "capabilityDelegation",
];

/// An input document with one `Multikey` verification method for an ed25519 public key, usable for authentication and
/// assertions.
pub fn ed25519_input_document(public_key: &[u8]) -> Value {
    let public_key_multibase = multibase::encode(&[&MULTICODEC_ED25519_PUB[..], public_key].concat());

    json!({
        "@context": [
            "https://www.w3.org/ns/did/v1",
            "https://w3id.org/security/multikey/v1"
        ],
        "verificationMethod": [{
            "id": KEY_FRAGMENT,
            "type": "Multikey",
            "publicKeyMultibase": public_key_multibase
        }],
        "authentication": [KEY_FRAGMENT],
        "assertionMethod": [KEY_FRAGMENT]
    })
}

/// Encodes `input_document` into a long form `did:peer:4` DID.
pub fn encode(input_document: &Value) -> Result<String, DidPeerError> {
    let json = serde_json::to_vec(input_document).map_err(|err| DidPeerError::InvalidDocument(err.to_string()))?;
    let encoded_document = multibase::encode(&[&MULTICODEC_JSON[..], &json].concat());

    Ok(format!("{PREFIX}{}:{encoded_document}", hash(&encoded_document)))
}

fn hash(encoded_document: &str) -> String {
    let digest = Sha256::digest(encoded_document.as_bytes());

    multibase::encode(&[&MULTIHASH_SHA2_256[..], digest.as_slice()].concat())
}

/// Splits a long form DID into its hash and encoded document.
fn split_long_form(did: &str) -> Result<(&str, &str), DidPeerError> {
    did.strip_prefix(PREFIX)
        .ok_or_else(|| DidPeerError::NotPeer4(did.to_string()))?
        .split_once(':')
        .ok_or_else(|| DidPeerError::ShortForm(did.to_string()))
}

pub fn is_peer4(did: &str) -> bool {
    did.starts_with(PREFIX)
}

pub fn short_form(did: &str) -> Result<String, DidPeerError> {
    let (hash, _) = split_long_form(did)?;

    Ok(format!("{PREFIX}{hash}"))
}

/// Resolves a long form DID into its DID document.
pub fn resolve(did: &str) -> Result<Value, DidPeerError> {
    let (expected_hash, encoded_document) = split_long_form(did)?;

    if hash(encoded_document) != expected_hash {
        return Err(DidPeerError::HashMismatch);
    }

    let bytes =
        multibase::decode(encoded_document).ok_or_else(|| DidPeerError::InvalidMultibase(encoded_document.to_string()))?;
    let json = bytes.strip_prefix(&MULTICODEC_JSON[..]).ok_or(DidPeerError::NotJson)?;

    let document = match serde_json::from_slice(json) {
        Ok(Value::Object(document)) => document,
        Ok(_) => return Err(DidPeerError::InvalidDocument("not a JSON object".to_string())),
        Err(err) => return Err(DidPeerError::InvalidDocument(err.to_string())),
    };

    Ok(Value::Object(contextualize(document, did, &format!("{PREFIX}{expected_hash}"))))
}

/// Anchors the input document to the DID it was resolved from.
fn contextualize(mut document: Map<String, Value>, did: &str, short_form: &str) -> Map<String, Value> {
    document.insert("id".to_string(), json!(did));

    match document.get_mut("alsoKnownAs") {
        Some(Value::Array(also_known_as)) => also_known_as.push(json!(short_form)),
        _ => {
            document.insert("alsoKnownAs".to_string(), json!([short_form]));
        }
    }

    let embedded_methods = document
        .iter_mut()
        .filter(|(key, _)| *key == "verificationMethod" || RELATIONSHIPS.contains(&key.as_str()))
        .filter_map(|(_, value)| value.as_array_mut())
        .flatten()
        .filter_map(Value::as_object_mut);

    for method in embedded_methods {
        method.entry("controller").or_insert_with(|| json!(did));
    }

    document
}

/// The first `assertionMethod` of a resolved document as an absolute DID URL.
pub fn first_assertion_method(document: &Value) -> Option<String> {
    let did = document.get("id")?.as_str()?;

    let reference = match document.get("assertionMethod")?.as_array()?.first()? {
        Value::String(reference) => reference.as_str(),
        Value::Object(method) => method.get("id")?.as_str()?,
        _ => return None,
    };

    Some(if reference.starts_with('#') {
        format!("{did}{reference}")
    } else {
        reference.to_string()
    })
}
