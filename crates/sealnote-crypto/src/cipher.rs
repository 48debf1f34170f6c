//! AES-256-CBC note body encryption
//!
//! Envelope format (text): `hex(iv) + ":" + hex(ciphertext)`
//!
//! The format is stable: notes written before a restart stay decryptable as
//! long as the configured key is unchanged. A fresh random 16-byte IV is drawn
//! per encryption, so two envelopes for the same plaintext never match.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use zeroize::Zeroize;

use crate::{IV_SIZE, KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// The process-wide note body cipher. Key is read-only after startup and
/// zeroized on drop.
#[derive(Clone)]
pub struct BodyCipher {
    key: [u8; KEY_SIZE],
}

impl BodyCipher {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Encrypt a note body into an `iv:ciphertext` hex envelope.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new((&self.key).into(), (&iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
    }

    /// Decrypt an envelope produced by `encrypt`.
    ///
    /// Fails on a malformed envelope, a key that differs from the one the
    /// envelope was written under, or a body that is not valid UTF-8. The
    /// failure is fatal to the single request, never to the process.
    pub fn decrypt(&self, envelope: &str) -> anyhow::Result<String> {
        // Split on the first ':' — the hex ciphertext cannot contain one.
        let (iv_hex, ct_hex) = envelope
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("malformed envelope: missing ':' separator"))?;

        let iv: [u8; IV_SIZE] = hex::decode(iv_hex)
            .map_err(|e| anyhow::anyhow!("malformed envelope IV: {e}"))?
            .try_into()
            .map_err(|_| anyhow::anyhow!("malformed envelope: IV must be {IV_SIZE} bytes"))?;

        let ciphertext =
            hex::decode(ct_hex).map_err(|e| anyhow::anyhow!("malformed envelope body: {e}"))?;

        let plaintext = Aes256CbcDec::new((&self.key).into(), (&iv).into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| {
                anyhow::anyhow!("body decryption failed: wrong key or corrupted envelope")
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| anyhow::anyhow!("decrypted body is not UTF-8: {e}"))
    }
}

impl Drop for BodyCipher {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl std::fmt::Debug for BodyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
