//! Single-use tokens that authorize inline script and style under the CSP

use std::fmt;

/// Number of random bytes in a nonce (hex-encoded to twice as many chars)
pub const NONCE_BYTES: usize = 16;

/// A hex-encoded random nonce
///
/// A new one is drawn for every rendered document. It is never derived from
/// the sketch text, so a stale or guessed value cannot unlock a later page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Draw a fresh nonce from the OS random source
    pub fn generate() -> Result<Self, getrandom::Error> {
        let mut bytes = [0u8; NONCE_BYTES];
        getrandom::fill(&mut bytes)?;
        Ok(Self::from_bytes(&bytes))
    }

    fn from_bytes(bytes: &[u8]) -> Self {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut out = String::with_capacity(bytes.len() * 2);
        for &b in bytes {
            out.push(HEX[usize::from(b >> 4)] as char);
            out.push(HEX[usize::from(b & 0x0f)] as char);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_32_lowercase_hex_chars() {
        let nonce = Nonce::generate().unwrap();
        assert_eq!(nonce.as_str().len(), NONCE_BYTES * 2);
        assert!(
            nonce
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_consecutive_nonces_differ() {
        let a = Nonce::generate().unwrap();
        let b = Nonce::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_encoding() {
        let nonce = Nonce::from_bytes(&[0x00, 0x0f, 0xa5, 0xff]);
        assert_eq!(nonce.to_string(), "000fa5ff");
    }
}
