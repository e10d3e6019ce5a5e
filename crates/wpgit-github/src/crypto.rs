//! At-rest encryption of the GitHub token
//!
//! Stored form: `base64(version_tag ‖ nonce[24] ‖ ciphertext+tag)`. The key is
//! `sha256(site_secret)`. Without a site secret a fixed key is used and the
//! cipher reports [`KeyStrength::Default`]; values encrypted that way are only
//! obfuscated.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
#[allow(deprecated)]
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Version tag for the XChaCha20-Poly1305 layout.
pub const VERSION_TAG: u8 = 0x01;

const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;
const AAD: &[u8] = b"wpgit:github_token";
const DEFAULT_SECRET: &str = "wpgit-default-site-secret";

/// Whether the key came from a configured secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrength {
    Configured,
    Default,
}

/// Symmetric cipher for the stored token.
#[derive(Clone)]
pub struct TokenCipher {
    key: [u8; 32],
    strength: KeyStrength,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("strength", &self.strength)
            .finish_non_exhaustive()
    }
}

impl TokenCipher {
    /// Derive the key from `site_secret`; `None` or blank selects the default key.
    pub fn new(site_secret: Option<&str>) -> Self {
        let (secret, strength) = match site_secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => (secret, KeyStrength::Configured),
            None => {
                tracing::warn!("No site secret configured; the GitHub token is stored with a default key");
                (DEFAULT_SECRET, KeyStrength::Default)
            }
        };
        Self {
            key: Sha256::digest(secret.as_bytes()).into(),
            strength,
        }
    }

    pub fn strength(&self) -> KeyStrength {
        self.strength
    }

    /// Encrypt `plaintext`. The empty string encrypts to the empty string.
    #[allow(deprecated)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let cipher = XChaCha20Poly1305::new((&self.key).into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: AAD,
                },
            )
            .map_err(|e| Error::Encrypt {
                message: e.to_string(),
            })?;

        let mut blob = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        blob.push(VERSION_TAG);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(blob))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    ///
    /// Anything that is not a well-formed, authentic blob under this key is
    /// an [`Error::Decrypt`]; there is no plaintext fallback.
    #[allow(deprecated)]
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        if stored.is_empty() {
            return Ok(String::new());
        }
        let decrypt_err = |message: &str| Error::Decrypt {
            message: message.to_string(),
        };

        let blob = BASE64
            .decode(stored.trim())
            .map_err(|_| decrypt_err("stored token is not valid base64"))?;
        if blob.len() < 1 + NONCE_LEN + TAG_LEN {
            return Err(decrypt_err("stored token is too short"));
        }
        let (tag, rest) = blob.split_at(1);
        if tag[0] != VERSION_TAG {
            return Err(decrypt_err("unknown token format version"));
        }
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        let cipher = XChaCha20Poly1305::new((&self.key).into());

        let plaintext = cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: AAD,
                },
            )
            .map_err(|_| decrypt_err("authentication failed; wrong site secret or corrupted value"))?;
        String::from_utf8(plaintext).map_err(|_| decrypt_err("token is not valid UTF-8"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_token_maps_to_empty_string() {
        let cipher = TokenCipher::new(Some("secret"));
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt("").unwrap(), "");
    }

    #[test]
    fn ciphertext_is_randomized() {
        let cipher = TokenCipher::new(Some("secret"));
        let a = cipher.encrypt("ghp_abc").unwrap();
        let b = cipher.encrypt("ghp_abc").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("ghp_abc"));
    }

    #[test]
    fn wrong_secret_fails_closed() {
        let stored = TokenCipher::new(Some("one")).encrypt("ghp_abc").unwrap();
        let err = TokenCipher::new(Some("two")).decrypt(&stored).unwrap_err();
        assert!(matches!(err, Error::Decrypt { .. }));
    }

    #[test]
    fn plain_base64_is_rejected() {
        let cipher = TokenCipher::new(Some("secret"));
        let legacy = BASE64.encode("ghp_plaintext_token_value_1234567890");
        assert!(matches!(cipher.decrypt(&legacy), Err(Error::Decrypt { .. })));
        assert!(matches!(cipher.decrypt("not base64!"), Err(Error::Decrypt { .. })));
    }

    #[test]
    fn default_key_is_flagged() {
        assert_eq!(TokenCipher::new(None).strength(), KeyStrength::Default);
        assert_eq!(TokenCipher::new(Some("  ")).strength(), KeyStrength::Default);
        assert_eq!(TokenCipher::new(Some("s")).strength(), KeyStrength::Configured);
    }

    proptest! {
        #[test]
        fn decrypt_inverts_encrypt(token in "[ -~]{0,80}") {
            let cipher = TokenCipher::new(Some("site-secret"));
            let stored = cipher.encrypt(&token).unwrap();
            prop_assert_eq!(cipher.decrypt(&stored).unwrap(), token);
        }
    }
}
