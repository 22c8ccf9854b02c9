//! Opaque public identifiers.
//!
//! Numeric primary keys never leave the service. Each id is scrambled with a
//! salted four round Feistel network and written in a salt-shuffled base62
//! alphabet, so the mapping is a bijection per salt and tokens for
//! consecutive ids share no visible structure.

use sha2::{Digest, Sha256};
use thiserror::Error;

const BASE_ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ROUNDS: u8 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashIdError {
    #[error("hashed id is empty")]
    Empty,

    #[error("hashed id contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("hashed id is out of range")]
    Overflow,

    #[error("hashed id is not in canonical form")]
    NonCanonical,
}

#[derive(Clone)]
pub struct HashIdCodec {
    key: [u8; 32],
    alphabet: [u8; 62],
    lookup: [Option<u8>; 128],
    min_length: usize,
}

impl std::fmt::Debug for HashIdCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // the salt-derived key stays out of logs
        f.debug_struct("HashIdCodec")
            .field("min_length", &self.min_length)
            .finish_non_exhaustive()
    }
}

impl HashIdCodec {
    pub fn new(salt: &str, min_length: usize) -> Self {
        let key: [u8; 32] = Sha256::digest(salt.as_bytes()).into();
        let alphabet = shuffle(&key);

        let mut lookup = [None; 128];
        for (digit, ch) in alphabet.iter().enumerate() {
            lookup[*ch as usize] = Some(digit as u8);
        }

        Self {
            key,
            alphabet,
            lookup,
            min_length,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn encode(&self, id: i64) -> String {
        let mut value = self.permute(id as u64);

        let mut digits = Vec::with_capacity(self.min_length.max(11));
        loop {
            digits.push(self.alphabet[(value % 62) as usize]);
            value /= 62;
            if value == 0 {
                break;
            }
        }
        while digits.len() < self.min_length {
            digits.push(self.alphabet[0]);
        }
        digits.reverse();

        // alphabet bytes are ASCII
        digits.into_iter().map(char::from).collect()
    }

    pub fn decode(&self, hashed: &str) -> Result<i64, HashIdError> {
        if hashed.is_empty() {
            return Err(HashIdError::Empty);
        }

        let mut value: u64 = 0;
        for ch in hashed.chars() {
            let digit = self
                .digit(ch)
                .ok_or(HashIdError::InvalidCharacter(ch))?;
            value = value
                .checked_mul(62)
                .and_then(|v| v.checked_add(u64::from(digit)))
                .ok_or(HashIdError::Overflow)?;
        }

        let id = self.unpermute(value) as i64;
        if self.encode(id) != hashed {
            return Err(HashIdError::NonCanonical);
        }
        Ok(id)
    }

    fn digit(&self, ch: char) -> Option<u8> {
        let index = ch as usize;
        if index < 128 { self.lookup[index] } else { None }
    }

    fn round(&self, round: u8, half: u32) -> u32 {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update([round]);
        hasher.update(half.to_be_bytes());
        let out = hasher.finalize();
        u32::from_be_bytes([out[0], out[1], out[2], out[3]])
    }

    fn permute(&self, value: u64) -> u64 {
        let (mut left, mut right) = ((value >> 32) as u32, value as u32);
        for round in 0..ROUNDS {
            let next = left ^ self.round(round, right);
            left = right;
            right = next;
        }
        (u64::from(left) << 32) | u64::from(right)
    }

    fn unpermute(&self, value: u64) -> u64 {
        let (mut left, mut right) = ((value >> 32) as u32, value as u32);
        for round in (0..ROUNDS).rev() {
            let prev = right ^ self.round(round, left);
            right = left;
            left = prev;
        }
        (u64::from(left) << 32) | u64::from(right)
    }
}

/// Fisher-Yates over the base alphabet driven by a hash stream of the key
fn shuffle(key: &[u8; 32]) -> [u8; 62] {
    let mut alphabet = *BASE_ALPHABET;
    let mut block: [u8; 32] = [0; 32];
    let mut counter: u32 = 0;
    let mut offset = block.len();

    for i in (1..alphabet.len()).rev() {
        if offset + 4 > block.len() {
            let mut hasher = Sha256::new();
            hasher.update(key);
            hasher.update(counter.to_be_bytes());
            block = hasher.finalize().into();
            counter += 1;
            offset = 0;
        }
        let r = u32::from_be_bytes([
            block[offset],
            block[offset + 1],
            block[offset + 2],
            block[offset + 3],
        ]);
        offset += 4;
        let j = (r as usize) % (i + 1);
        alphabet.swap(i, j);
    }

    alphabet
}
