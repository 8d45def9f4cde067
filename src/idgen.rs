//! Random sync ID generation.
//!
//! IDs double as bearer credentials (knowing the ID is the only
//! authorization the service has), so they are drawn from the OS secure
//! randomness source rather than a seeded PRNG.

use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, Error)]
pub enum GenError {
    #[error("secure randomness unavailable: {0}")]
    RandomnessUnavailable(#[from] rand::Error),
}

/// Returns a random string of `length` characters, each drawn
/// independently and uniformly from the 36-character lowercase
/// alphanumeric alphabet.
pub fn string(length: usize) -> Result<String, GenError> {
    // Bytes 252..=255 are rejected so every alphabet character stays
    // equally likely (252 = 36 * 7).
    const REJECT_ABOVE: u8 = (ALPHABET.len() * 7) as u8;

    let mut out = String::with_capacity(length);
    let mut buf = [0u8; 64];

    while out.len() < length {
        OsRng.try_fill_bytes(&mut buf)?;
        for &byte in buf.iter() {
            if byte >= REJECT_ABOVE {
                continue;
            }
            out.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            if out.len() == length {
                break;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_requested_length() {
        for length in [0, 1, 16, 32, 100] {
            let id = string(length).unwrap();
            assert_eq!(id.len(), length);
        }
    }

    #[test]
    fn stays_within_alphabet() {
        let id = string(4096).unwrap();
        assert!(
            id.bytes().all(|b| ALPHABET.contains(&b)),
            "unexpected character in {id}"
        );
    }

    #[test]
    fn consecutive_ids_differ() {
        let a = string(32).unwrap();
        let b = string(32).unwrap();
        assert_ne!(a, b);
    }
}
