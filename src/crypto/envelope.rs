use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use aes_gcm::aead::rand_core::RngCore;
use base64::{Engine as _, engine::general_purpose};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};
use crate::error::{AppError, Result};

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// The transport secret, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct SecretKey([u8; KEY_SIZE]);

/// The request shape every protocol operation accepts: a single field
/// holding a sealed string.
#[derive(Deserialize, Debug)]
pub struct SealedRequest {
    pub body: String,
}

/// The response shape every protocol operation produces.
#[derive(Serialize)]
pub struct SealedResponse {
    pub body: String,
}

/// Symmetric codec for the opaque envelopes that wrap every payload
/// crossing the service boundary.
///
/// Wire format: `base64(nonce || AES-256-GCM ciphertext)` over the JSON
/// encoding of the payload. Ciphertext is intentionally non-deterministic
/// per call (fresh nonce each time).
#[derive(Clone)]
pub struct Envelope {
    key: SecretKey,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("key", &"<redacted>").finish()
    }
}

impl Envelope {
    /// Builds the codec from the raw transport secret.
    ///
    /// # Arguments
    ///
    /// * `secret` - The 32-byte secret established at startup.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Envelope`, or a `Configuration` error if
    /// the secret is absent or has the wrong length.
    pub fn new(secret: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = secret.try_into().map_err(|_| {
            AppError::Configuration(format!(
                "Transport secret must be exactly {} bytes",
                KEY_SIZE
            ))
        })?;
        Ok(Self { key: SecretKey(key) })
    }

    /// Seals a structured value into an opaque transport string.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String> {
        let plaintext = sonic_rs::to_string(value)
            .map_err(|e| AppError::Internal(format!("Envelope serialization failed: {}", e)))?;

        let cipher = Aes256Gcm::new((&self.key.0).into());

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(sealed))
    }

    /// Opens an opaque transport string back into a structured value.
    ///
    /// Fails with `Decryption` if the input is not valid base64, is too
    /// short to carry a nonce, fails authentication, or does not decode
    /// into the expected shape.
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T> {
        let bytes = general_purpose::STANDARD
            .decode(sealed.trim())
            .map_err(|_| AppError::Decryption("Envelope is not valid base64".to_string()))?;

        if bytes.len() <= NONCE_SIZE {
            return Err(AppError::Decryption("Envelope is truncated".to_string()));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let cipher = Aes256Gcm::new((&self.key.0).into());

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::Decryption("Envelope failed authentication".to_string()))?;

        sonic_rs::from_slice(&plaintext).map_err(|e| {
            AppError::Decryption(format!("Envelope payload is not valid data: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Payload {
        message: String,
        count: u32,
    }

    fn codec() -> Envelope {
        Envelope::new(&[7u8; KEY_SIZE]).unwrap()
    }

    #[test]
    fn rejects_short_secret() {
        let err = Envelope::new(b"too short").unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn seal_open_round_trip() {
        let envelope = codec();
        let payload = Payload {
            message: "Attendance Confirmed".to_string(),
            count: 3,
        };

        let sealed = envelope.seal(&payload).unwrap();
        let opened: Payload = envelope.open(&sealed).unwrap();

        assert_eq!(opened, payload);
    }

    #[test]
    fn ciphertext_is_nondeterministic() {
        let envelope = codec();
        let payload = Payload {
            message: "same plaintext".to_string(),
            count: 1,
        };

        let first = envelope.seal(&payload).unwrap();
        let second = envelope.seal(&payload).unwrap();

        assert_ne!(first, second);
        assert_eq!(envelope.open::<Payload>(&first).unwrap(), payload);
        assert_eq!(envelope.open::<Payload>(&second).unwrap(), payload);
    }

    #[test]
    fn double_wrapping_opens_twice() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            #[serde(rename = "rawSealedToken")]
            raw_sealed_token: String,
        }

        let envelope = codec();
        let inner = envelope
            .seal(&Payload {
                message: "inner token".to_string(),
                count: 0,
            })
            .unwrap();
        let outer = envelope
            .seal(&Wrapper {
                raw_sealed_token: inner,
            })
            .unwrap();

        let record: Wrapper = envelope.open(&outer).unwrap();
        let opened: Payload = envelope.open(&record.raw_sealed_token).unwrap();

        assert_eq!(opened.message, "inner token");
    }

    #[test]
    fn open_rejects_garbage() {
        let envelope = codec();
        let err = envelope.open::<Payload>("garbage").unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn open_rejects_tampered_ciphertext() {
        let envelope = codec();
        let sealed = envelope
            .seal(&Payload {
                message: "original".to_string(),
                count: 9,
            })
            .unwrap();

        let mut bytes = general_purpose::STANDARD.decode(&sealed).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = general_purpose::STANDARD.encode(bytes);

        let err = envelope.open::<Payload>(&tampered).unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }

    #[test]
    fn open_rejects_wrong_key() {
        let sealed = codec()
            .seal(&Payload {
                message: "sealed under key A".to_string(),
                count: 4,
            })
            .unwrap();

        let other = Envelope::new(&[8u8; KEY_SIZE]).unwrap();
        let err = other.open::<Payload>(&sealed).unwrap_err();
        assert!(matches!(err, AppError::Decryption(_)));
    }
}
