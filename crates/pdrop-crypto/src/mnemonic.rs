//! 24-word passphrase codec
//!
//! The secret's 264 bits are split into 24 groups of 11 bits (MSB first), and
//! each group indexes the 2048-word BIP-39 English list. Unlike a BIP-39
//! mnemonic there is no checksum: any 24 list words decode to a secret, so a
//! passphrase decodes exactly when every slot holds a list word.
//!
//! A `Passphrase` keeps unset slots as a first-class state so that entry can
//! be validated word by word while the user is still typing.

use bip39::Language;
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::secret::Secret;
use crate::{BITS_PER_WORD, SECRET_SIZE, WORD_COUNT};

const WORD_MASK: u32 = (1 << BITS_PER_WORD) - 1;

/// A 24-slot passphrase; each slot holds a word or is unset.
///
/// Words are stored normalized (trimmed, lower-case). Zeroized on drop since
/// a complete passphrase is equivalent to the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase {
    slots: [Option<String>; WORD_COUNT],
}

impl Passphrase {
    /// An empty passphrase with every slot unset.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Fill slots from whitespace-separated words.
    ///
    /// Fewer than 24 words leaves the trailing slots unset; more is an error.
    pub fn parse(text: &str) -> CryptoResult<Self> {
        let count = text.split_whitespace().count();
        if count > WORD_COUNT {
            return Err(CryptoError::TooManyWords(count));
        }

        let mut passphrase = Self::new();
        for (slot, word) in text.split_whitespace().enumerate() {
            passphrase.slots[slot] = Some(normalize(word));
        }
        Ok(passphrase)
    }

    /// Set or clear a single slot. Empty input clears it.
    pub fn set(&mut self, slot: usize, word: Option<&str>) -> CryptoResult<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(CryptoError::SlotOutOfRange(slot))?;

        if let Some(old) = entry.as_mut() {
            old.zeroize();
        }
        *entry = word.map(normalize).filter(|w| !w.is_empty());
        Ok(())
    }

    pub fn get(&self, slot: usize) -> Option<&str> {
        self.slots.get(slot).and_then(|w| w.as_deref())
    }

    pub fn slots(&self) -> &[Option<String>; WORD_COUNT] {
        &self.slots
    }

    /// Indices of slots with no word yet.
    pub fn unset_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of slots holding a word that is not in the word list.
    pub fn invalid_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, w)| match w {
                Some(word) if word_index(word).is_none() => Some(i),
                _ => None,
            })
            .collect()
    }

    /// True iff all 24 slots hold list words.
    pub fn is_complete(&self) -> bool {
        self.slots
            .iter()
            .all(|w| w.as_deref().is_some_and(|word| word_index(word).is_some()))
    }
}

impl Default for Passphrase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        for word in self.slots.iter_mut().flatten() {
            word.zeroize();
        }
    }
}

/// Space-separated words; unset slots render as `_`.
impl std::fmt::Display for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(slot.as_deref().unwrap_or("_"))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.slots.iter().filter(|w| w.is_some()).count();
        f.debug_struct("Passphrase")
            .field("words", &"[REDACTED]")
            .field("set", &set)
            .finish()
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Position of `word` in the BIP-39 English list.
fn word_index(word: &str) -> Option<u32> {
    Language::English.find_word(word).map(u32::from)
}

/// Encode a secret as a complete 24-word passphrase.
pub fn encode(secret: &Secret) -> Passphrase {
    let list = Language::English.word_list();
    let mut passphrase = Passphrase::new();

    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut slot = 0;
    for &byte in secret.as_bytes() {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= BITS_PER_WORD {
            bits -= BITS_PER_WORD;
            let index = (acc >> bits) & WORD_MASK;
            passphrase.slots[slot] = Some(list[index as usize].to_string());
            slot += 1;
        }
        acc &= (1 << bits) - 1;
    }
    acc.zeroize();

    debug_assert_eq!(slot, WORD_COUNT);
    passphrase
}

/// Decode a passphrase back into its secret.
///
/// Fails with `Incomplete` if any slot is unset (checked first), then with
/// `InvalidWord` naming the first slot whose word is not in the list.
pub fn decode(passphrase: &Passphrase) -> CryptoResult<Secret> {
    let unset = passphrase.unset_slots().len();
    if unset > 0 {
        return Err(CryptoError::Incomplete { unset });
    }

    let mut bytes = [0u8; SECRET_SIZE];
    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut pos = 0;
    for (slot, word) in passphrase.slots.iter().enumerate() {
        let index = word
            .as_deref()
            .and_then(word_index)
            .ok_or(CryptoError::InvalidWord { slot })?;

        acc = (acc << BITS_PER_WORD) | index;
        bits += BITS_PER_WORD;
        while bits >= 8 {
            bits -= 8;
            bytes[pos] = (acc >> bits) as u8;
            pos += 1;
        }
        acc &= (1 << bits) - 1;
    }
    acc.zeroize();

    let secret = Secret::from_bytes(bytes);
    bytes.zeroize();
    Ok(secret)
}

/// Whether a passphrase is well-formed enough to attempt a download.
pub fn validate_password(passphrase: &Passphrase) -> bool {
    passphrase.is_complete()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_words() -> Vec<&'static str> {
        Language::English.word_list()[..WORD_COUNT].to_vec()
    }

    #[test]
    fn test_encode_produces_24_list_words() {
        let passphrase = encode(&Secret::generate());

        assert!(passphrase.unset_slots().is_empty());
        assert!(passphrase.invalid_slots().is_empty());
        assert!(passphrase.is_complete());
        assert_eq!(passphrase.to_string().split_whitespace().count(), 24);
    }

    #[test]
    fn test_word_index_matches_list() {
        let list = Language::English.word_list();

        assert_eq!(word_index("abandon"), Some(0));
        assert_eq!(word_index("zoo"), Some(2047));
        for (i, word) in list.iter().enumerate().step_by(97) {
            assert_eq!(word_index(word), Some(i as u32), "{word}");
        }
        assert_eq!(word_index("aban"), None);
        assert_eq!(word_index("Abandon"), None, "lookup expects normalized words");
    }

    #[test]
    fn test_known_vectors() {
        // All-zero bits index word 0 in every slot
        let zero = encode(&Secret::from_bytes([0u8; SECRET_SIZE]));
        assert!(zero.slots().iter().all(|w| w.as_deref() == Some("abandon")));

        // All-one bits index word 2047 in every slot
        let ones = encode(&Secret::from_bytes([0xFFu8; SECRET_SIZE]));
        assert!(ones.slots().iter().all(|w| w.as_deref() == Some("zoo")));

        // Leading bits 00000000 001 -> index 1 ("ability")
        let mut bytes = [0u8; SECRET_SIZE];
        bytes[1] = 0b0010_0000;
        let one = encode(&Secret::from_bytes(bytes));
        assert_eq!(one.get(0), Some("ability"));
        assert_eq!(one.get(1), Some("abandon"));
    }

    #[test]
    fn test_decode_incomplete() {
        let mut passphrase = encode(&Secret::generate());
        passphrase.set(23, None).unwrap();

        assert_eq!(
            decode(&passphrase).unwrap_err(),
            CryptoError::Incomplete { unset: 1 }
        );
        assert!(!passphrase.is_complete());
    }

    #[test]
    fn test_decode_invalid_word() {
        let mut passphrase = encode(&Secret::generate());
        passphrase.set(5, Some("notaword")).unwrap();

        assert_eq!(
            decode(&passphrase).unwrap_err(),
            CryptoError::InvalidWord { slot: 5 }
        );
        assert_eq!(passphrase.invalid_slots(), vec![5]);
        assert!(!validate_password(&passphrase));
    }

    #[test]
    fn test_incomplete_takes_precedence() {
        let mut passphrase = Passphrase::parse("bogus").unwrap();
        passphrase.set(1, Some("abandon")).unwrap();

        assert_eq!(
            decode(&passphrase).unwrap_err(),
            CryptoError::Incomplete { unset: 22 }
        );
    }

    #[test]
    fn test_parse_normalizes_and_pads() {
        let passphrase = Passphrase::parse("  Abandon\tZOO  ").unwrap();

        assert_eq!(passphrase.get(0), Some("abandon"));
        assert_eq!(passphrase.get(1), Some("zoo"));
        assert_eq!(passphrase.unset_slots().len(), 22);
        assert!(passphrase.invalid_slots().is_empty());
        assert!(!passphrase.is_complete());
    }

    #[test]
    fn test_parse_too_many_words() {
        let text = vec!["abandon"; 25].join(" ");
        assert_eq!(
            Passphrase::parse(&text).unwrap_err(),
            CryptoError::TooManyWords(25)
        );
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let passphrase = encode(&Secret::generate());
        let reparsed = Passphrase::parse(&passphrase.to_string()).unwrap();
        assert_eq!(reparsed, passphrase);
    }

    #[test]
    fn test_display_marks_unset() {
        let passphrase = Passphrase::parse("abandon").unwrap();
        let shown = passphrase.to_string();
        assert!(shown.starts_with("abandon _ _"));
    }

    #[test]
    fn test_set_slot_out_of_range() {
        let mut passphrase = Passphrase::new();
        assert_eq!(
            passphrase.set(24, Some("abandon")).unwrap_err(),
            CryptoError::SlotOutOfRange(24)
        );
    }

    #[test]
    fn test_set_empty_clears_slot() {
        let mut passphrase = Passphrase::parse("abandon").unwrap();
        passphrase.set(0, Some("   ")).unwrap();
        assert_eq!(passphrase.get(0), None);
    }

    #[test]
    fn test_complete_passphrase_of_list_words() {
        let passphrase = Passphrase::parse(&valid_words().join(" ")).unwrap();
        assert!(passphrase.is_complete());
        assert!(decode(&passphrase).is_ok());
    }

    #[test]
    fn test_debug_redacted() {
        let passphrase = encode(&Secret::from_bytes([0u8; SECRET_SIZE]));
        let dbg = format!("{passphrase:?}");
        assert!(!dbg.contains("abandon"));
        assert!(dbg.contains("set: 24"));
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(bytes in proptest::array::uniform32(any::<u8>()), last in any::<u8>()) {
            let mut full = [0u8; SECRET_SIZE];
            full[..32].copy_from_slice(&bytes);
            full[32] = last;
            let secret = Secret::from_bytes(full);

            let decoded = decode(&encode(&secret)).unwrap();
            prop_assert_eq!(decoded.as_bytes(), secret.as_bytes());
        }

        #[test]
        fn prop_decode_fails_iff_incomplete(
            indices in proptest::collection::vec(0usize..2048, WORD_COUNT),
            holes in proptest::collection::vec(any::<bool>(), WORD_COUNT),
            bad in proptest::collection::vec(any::<bool>(), WORD_COUNT),
        ) {
            let list = Language::English.word_list();
            let mut passphrase = Passphrase::new();
            for slot in 0..WORD_COUNT {
                let word = if holes[slot] && bad[slot] {
                    None
                } else if bad[slot] {
                    Some("xyzzy")
                } else {
                    Some(list[indices[slot]])
                };
                passphrase.set(slot, word).unwrap();
            }

            prop_assert_eq!(decode(&passphrase).is_ok(), passphrase.is_complete());
        }
    }
}
