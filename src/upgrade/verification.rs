use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length in bytes of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;

/// Verifies candidate binaries against the digest published in the update metadata.
///
/// Verification happens entirely in memory, before any byte reaches the
/// executable path.
///
/// # Security Benefits
///
/// - **Download Integrity**: Detects corrupted or truncated downloads
/// - **Patch Correctness**: Detects a delta applied against the wrong base binary
/// - **Tamper Detection**: Rejects payloads that differ from what the server published
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the SHA-256 digest of `bytes`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use autopatch_cli::upgrade::verification::ChecksumVerifier;
    ///
    /// let digest = ChecksumVerifier::sha256(b"Hello, World!");
    /// assert_eq!(digest.len(), 32);
    /// ```
    pub fn sha256(bytes: &[u8]) -> [u8; DIGEST_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hasher.finalize().into()
    }

    /// Check `bytes` against `expected`.
    ///
    /// The comparison runs in constant time over the digest. An `expected`
    /// value that is not exactly 32 bytes never verifies.
    pub fn verify(bytes: &[u8], expected: &[u8]) -> bool {
        if expected.len() != DIGEST_LEN {
            return false;
        }
        let actual = Self::sha256(bytes);
        actual.as_slice().ct_eq(expected).into()
    }

    /// Hex rendering of a digest for logs and error messages.
    pub fn hex_digest(digest: &[u8]) -> String {
        hex::encode(digest)
    }
}
