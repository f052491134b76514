//! Multibase in its base58btc flavour, the only base used here.

/// Multibase prefix of base58btc.
pub const BASE58BTC: char = 'z';

pub fn encode(bytes: &[u8]) -> String {
    format!("{BASE58BTC}{}", bs58::encode(bytes).into_string())
}

/// Decodes a base58btc multibase value. Other bases are not supported.
pub fn decode(value: &str) -> Option<Vec<u8>> {
    value
        .strip_prefix(BASE58BTC)
        .and_then(|encoded| bs58::decode(encoded).into_vec().ok())
}
