//! HMAC-SHA256 primitives shared by the canonical-request signers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::LlmError;

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    hex::encode(Sha256::digest(data.as_ref()))
}

/// Raw HMAC-SHA256 digest.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<Vec<u8>, LlmError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| LlmError::InternalError(format!("HMAC key rejected: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Lowercase hex HMAC-SHA256.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> Result<String, LlmError> {
    hmac_sha256(key, message).map(hex::encode)
}

/// Chained key derivation: `HMAC(...HMAC(HMAC(seed, parts[0]), parts[1])..., parts[n])`.
///
/// Each step is keyed by the previous digest. The chain depth is the number of parts.
pub fn derive_key(seed: &[u8], parts: &[&str]) -> Result<Vec<u8>, LlmError> {
    let mut key = seed.to_vec();
    for part in parts {
        key = hmac_sha256(&key, part.as_bytes())?;
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn rfc4231_case_2() {
        let mac = hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            mac,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn derive_key_chains_in_order() {
        let step1 = hmac_sha256(b"seed", b"a").unwrap();
        let step2 = hmac_sha256(&step1, b"b").unwrap();
        assert_eq!(derive_key(b"seed", &["a", "b"]).unwrap(), step2);
        assert_ne!(derive_key(b"seed", &["b", "a"]).unwrap(), step2);
        assert_eq!(derive_key(b"seed", &[]).unwrap(), b"seed".to_vec());
    }
}
