//! sealnote-crypto: the three cryptographic seams of the note service
//!
//! - `cipher`: AES-256-CBC at-rest encryption of note bodies
//!   (envelope format: `hex(iv):hex(ciphertext)`, stable across restarts)
//! - `password`: Argon2id credential hashing with salt embedded in the digest
//! - `token`: HMAC-SHA256 signed bearer tokens with a fixed 7-day expiry

pub mod cipher;
pub mod password;
pub mod token;

pub use cipher::BodyCipher;
pub use password::HashParams;

/// Size of the body encryption key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-CBC initialization vector
pub const IV_SIZE: usize = 16;
