//! pdrop-crypto: client-side crypto for anonymous passphrase drops
//!
//! Pipeline:
//! ```text
//! Secret (264-bit random)
//!   ├── Passphrase: 24 × 11-bit groups → BIP-39 English words (no checksum)
//!   └── Root Key: Argon2id(secret, fixed salt)
//!         ├── Encryption Key (HKDF, info="pdrop-encryption-key")
//!         │     └── File envelope AEAD: XChaCha20-Poly1305
//!         │           (key=encryption key, nonce=random 192-bit, AAD=prefix||index||count)
//!         └── Storage Id (HKDF, info="pdrop-lookup-id", hex)
//! ```

pub mod envelope;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod manifest;
pub mod mnemonic;
pub mod secret;

pub use envelope::{decrypt_file, encrypt_file, FileEnvelope};
pub use error::{CryptoError, CryptoResult};
pub use kdf::KdfParams;
pub use keys::{derive_keys, DerivedKeys, EncryptionKey, StorageId};
pub use manifest::{DropBundle, ManifestEntry};
pub use mnemonic::{decode, encode, validate_password, Passphrase};
pub use secret::Secret;

/// Number of words in a passphrase
pub const WORD_COUNT: usize = 24;

/// Bits carried by one word (2048-word list)
pub const BITS_PER_WORD: u32 = 11;

/// Size of the secret in bytes (24 × 11 bits = 264 bits)
pub const SECRET_SIZE: usize = 33;

/// Size of a derived key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an XChaCha20-Poly1305 nonce (192-bit)
pub const NONCE_SIZE: usize = 24;

/// Size of a Poly1305 authentication tag
pub const TAG_SIZE: usize = 16;

const _: () = assert!(WORD_COUNT * BITS_PER_WORD as usize == SECRET_SIZE * 8);
