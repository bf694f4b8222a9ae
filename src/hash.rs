//! Frame content digests.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Fixed-length content digest of one sampled frame.
///
/// Two frames are considered identical exactly when their digests are equal.
/// There is no notion of "similar" frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHash(blake3::Hash);

impl FrameHash {
    /// Digest an encoded frame.
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    /// Lowercase hex form, 64 characters.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl Display for FrameHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::FrameHash;

    #[test]
    fn digest_is_deterministic_and_exact() {
        assert_eq!(FrameHash::of(b"frame"), FrameHash::of(b"frame"));
        assert_ne!(FrameHash::of(b"frame"), FrameHash::of(b"frame "));
    }

    #[test]
    fn hex_form_is_fixed_length() {
        let hex = FrameHash::of(b"").to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(FrameHash::of(b"").to_string(), hex);
    }

    #[test]
    fn hex_matches_the_blake3_reference_digest() {
        assert_eq!(
            FrameHash::of(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }
}
