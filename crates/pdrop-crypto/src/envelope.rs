//! Per-file XChaCha20-Poly1305 envelopes
//!
//! Envelope format (binary):
//! ```text
//! [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
//! AAD = "pdrop-envelope-v1" || index (8 bytes BE) || count (8 bytes BE)
//! ```
//!
//! The plaintext carries the name and MIME type alongside the content so the
//! store learns nothing but the envelope's size:
//! ```text
//! [u32 BE name len][name][u32 BE mime len][mime][content]
//! ```

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use pdrop_core::File;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::EncryptionKey;
use crate::{NONCE_SIZE, TAG_SIZE};

const AAD_PREFIX: &[u8] = b"pdrop-envelope-v1";

/// One file's encrypted, integrity-protected representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEnvelope {
    pub nonce: [u8; NONCE_SIZE],
    /// Ciphertext with the 16-byte tag appended
    pub ciphertext: Vec<u8>,
}

impl FileEnvelope {
    /// `[nonce][ciphertext + tag]`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split wire bytes; anything shorter than nonce + tag is corrupt.
    pub fn from_bytes(data: &[u8]) -> CryptoResult<Self> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::IntegrityFailure);
        }
        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        nonce_bytes.copy_from_slice(nonce);
        Ok(Self {
            nonce: nonce_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        NONCE_SIZE + self.ciphertext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

/// Encrypt a file under `key` with a fresh random nonce.
///
/// `index` is the file's position in a drop of `count` files; both must be
/// passed unchanged to `decrypt_file`, so dropping or reordering envelopes
/// fails authentication.
pub fn encrypt_file(
    key: &EncryptionKey,
    index: u64,
    count: u64,
    file: &File,
) -> CryptoResult<FileEnvelope> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut plaintext = encode_plaintext(file)?;
    let aad = build_aad(index, count);

    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: &plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| CryptoError::Encryption(format!("file encryption failed: {e}")));
    plaintext.zeroize();

    Ok(FileEnvelope {
        nonce,
        ciphertext: ciphertext?,
    })
}

/// Decrypt an envelope back into the file it was made from.
///
/// Wrong key, wrong index or count, tampering, and truncation all fail with
/// `IntegrityFailure`; nothing is returned on failure.
pub fn decrypt_file(
    key: &EncryptionKey,
    index: u64,
    count: u64,
    envelope: &FileEnvelope,
) -> CryptoResult<File> {
    if envelope.ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::IntegrityFailure);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let aad = build_aad(index, count);

    let mut plaintext = cipher
        .decrypt(
            XNonce::from_slice(&envelope.nonce),
            Payload {
                msg: &envelope.ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| CryptoError::IntegrityFailure)?;

    let file = decode_plaintext(&plaintext);
    plaintext.zeroize();
    file
}

/// Build AAD: prefix || index (8 bytes BE) || count (8 bytes BE)
fn build_aad(index: u64, count: u64) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_PREFIX.len() + 16);
    aad.extend_from_slice(AAD_PREFIX);
    aad.extend_from_slice(&index.to_be_bytes());
    aad.extend_from_slice(&count.to_be_bytes());
    aad
}

fn encode_plaintext(file: &File) -> CryptoResult<Vec<u8>> {
    let name = file.name.as_bytes();
    let mime = file.mime_type.as_bytes();
    let name_len = u32::try_from(name.len())
        .map_err(|_| CryptoError::Encryption("file name too long".into()))?;
    let mime_len = u32::try_from(mime.len())
        .map_err(|_| CryptoError::Encryption("MIME type too long".into()))?;

    let mut out = Vec::with_capacity(8 + name.len() + mime.len() + file.content.len());
    out.extend_from_slice(&name_len.to_be_bytes());
    out.extend_from_slice(name);
    out.extend_from_slice(&mime_len.to_be_bytes());
    out.extend_from_slice(mime);
    out.extend_from_slice(&file.content);
    Ok(out)
}

fn decode_plaintext(data: &[u8]) -> CryptoResult<File> {
    let (name, rest) = take_field(data)?;
    let (mime, content) = take_field(rest)?;

    let name = std::str::from_utf8(name).map_err(|_| CryptoError::IntegrityFailure)?;
    let mime = std::str::from_utf8(mime).map_err(|_| CryptoError::IntegrityFailure)?;

    Ok(File::new(name, mime, content.to_vec()))
}

/// Split a u32-length-prefixed field off the front of `data`.
fn take_field(data: &[u8]) -> CryptoResult<(&[u8], &[u8])> {
    if data.len() < 4 {
        return Err(CryptoError::IntegrityFailure);
    }
    let (len, rest) = data.split_at(4);
    let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
    if rest.len() < len {
        return Err(CryptoError::IntegrityFailure);
    }
    Ok(rest.split_at(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;
    use proptest::prelude::*;

    fn key(byte: u8) -> EncryptionKey {
        EncryptionKey::from_bytes([byte; KEY_SIZE])
    }

    fn sample_file() -> File {
        File::new("notes.txt", "text/plain", b"hello, encrypted world!".to_vec())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let file = sample_file();

        let envelope = encrypt_file(&key(1), 0, 1, &file).unwrap();
        let decrypted = decrypt_file(&key(1), 0, 1, &envelope).unwrap();

        assert_eq!(decrypted, file);
    }

    #[test]
    fn test_roundtrip_empty_fields() {
        let file = File::new("", "", Vec::new());

        let envelope = encrypt_file(&key(1), 3, 1, &file).unwrap();
        assert_eq!(decrypt_file(&key(1), 3, 1, &envelope).unwrap(), file);
    }

    #[test]
    fn test_roundtrip_unicode_name() {
        let file = File::new("||résumé 履歴書.pdf||", "application/pdf", vec![0, 255, 0, 255]);

        let envelope = encrypt_file(&key(2), 0, 1, &file).unwrap();
        assert_eq!(decrypt_file(&key(2), 0, 1, &envelope).unwrap(), file);
    }

    #[test]
    fn test_decrypt_wrong_key() {
        let envelope = encrypt_file(&key(1), 0, 1, &sample_file()).unwrap();
        let result = decrypt_file(&key(2), 0, 1, &envelope);

        assert_eq!(result.unwrap_err(), CryptoError::IntegrityFailure);
    }

    #[test]
    fn test_decrypt_wrong_index() {
        let envelope = encrypt_file(&key(1), 0, 1, &sample_file()).unwrap();
        let result = decrypt_file(&key(1), 1, 1, &envelope);

        assert_eq!(
            result.unwrap_err(),
            CryptoError::IntegrityFailure,
            "wrong index must fail (AAD mismatch)"
        );
    }

    #[test]
    fn test_decrypt_wrong_count() {
        let envelope = encrypt_file(&key(1), 0, 2, &sample_file()).unwrap();

        assert_eq!(decrypt_file(&key(1), 0, 2, &envelope).unwrap(), sample_file());
        assert_eq!(
            decrypt_file(&key(1), 0, 1, &envelope).unwrap_err(),
            CryptoError::IntegrityFailure,
            "envelope from a two-file drop must not open as a one-file drop"
        );
    }

    #[test]
    fn test_tampered_ciphertext() {
        let mut envelope = encrypt_file(&key(1), 0, 1, &sample_file()).unwrap();
        envelope.ciphertext[0] ^= 0xFF;

        assert_eq!(
            decrypt_file(&key(1), 0, 1, &envelope).unwrap_err(),
            CryptoError::IntegrityFailure
        );
    }

    #[test]
    fn test_tampered_nonce() {
        let mut envelope = encrypt_file(&key(1), 0, 1, &sample_file()).unwrap();
        envelope.nonce[0] ^= 0x01;

        assert!(decrypt_file(&key(1), 0, 1, &envelope).is_err());
    }

    #[test]
    fn test_truncated_envelope() {
        let envelope = encrypt_file(&key(1), 0, 1, &sample_file()).unwrap();
        let bytes = envelope.to_bytes();

        assert_eq!(
            FileEnvelope::from_bytes(&bytes[..NONCE_SIZE + TAG_SIZE - 1]).unwrap_err(),
            CryptoError::IntegrityFailure
        );

        let short = FileEnvelope::from_bytes(&bytes[..bytes.len() - 1]).unwrap();
        assert!(decrypt_file(&key(1), 0, 1, &short).is_err());
    }

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let file = sample_file();
        let a = encrypt_file(&key(1), 0, 1, &file).unwrap();
        let b = encrypt_file(&key(1), 0, 1, &file).unwrap();

        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_envelope_size() {
        let file = File::new("a", "b", vec![0u8; 1000]);
        let envelope = encrypt_file(&key(1), 0, 1, &file).unwrap();

        // nonce (24) + name/mime framing (4 + 1 + 4 + 1) + content (1000) + tag (16)
        assert_eq!(envelope.len(), 24 + 10 + 1000 + 16);
        assert_eq!(envelope.to_bytes().len(), envelope.len());
    }

    #[test]
    fn test_ciphertext_hides_name() {
        let file = File::new("very-secret-name.txt", "text/plain", Vec::new());
        let bytes = encrypt_file(&key(1), 0, 1, &file).unwrap().to_bytes();

        assert!(!bytes
            .windows(file.name.len())
            .any(|w| w == file.name.as_bytes()));
    }

    #[test]
    fn test_wire_bytes_roundtrip() {
        let envelope = encrypt_file(&key(5), 0, 1, &sample_file()).unwrap();
        let parsed = FileEnvelope::from_bytes(&envelope.to_bytes()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_decode_plaintext_rejects_bad_length() {
        let mut data = Vec::new();
        data.extend_from_slice(&100u32.to_be_bytes());
        data.extend_from_slice(b"short");

        assert_eq!(decode_plaintext(&data).unwrap_err(), CryptoError::IntegrityFailure);
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            name in ".{0,64}",
            mime in "[a-z]{1,12}/[a-z0-9.+-]{1,20}",
            content in proptest::collection::vec(any::<u8>(), 0..2048),
            index in any::<u64>(),
            count in any::<u64>(),
        ) {
            let file = File::new(name, mime, content);
            let envelope = encrypt_file(&key(7), index, count, &file).unwrap();
            prop_assert_eq!(decrypt_file(&key(7), index, count, &envelope).unwrap(), file);
        }

        #[test]
        fn prop_wrong_key_fails(content in proptest::collection::vec(any::<u8>(), 0..256), k1 in any::<u8>(), k2 in any::<u8>()) {
            prop_assume!(k1 != k2);
            let file = File::new("f", "application/octet-stream", content);
            let envelope = encrypt_file(&key(k1), 0, 1, &file).unwrap();
            prop_assert_eq!(decrypt_file(&key(k2), 0, 1, &envelope), Err(CryptoError::IntegrityFailure));
        }
    }
}
