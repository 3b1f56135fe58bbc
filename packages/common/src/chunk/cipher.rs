use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};
use rand::RngCore;

use super::{Chunk, ChunkError};

/// XChaCha20 nonce length. A fresh random nonce is drawn per sealed chunk and
/// prepended to the ciphertext; reusing one nonce across chunks would leak
/// keystream.
pub const NONCE_LEN: usize = 24;

/// Poly1305 authentication tag length.
pub const TAG_LEN: usize = 16;

/// Seals and opens individual chunks with XChaCha20-Poly1305.
///
/// Envelope: `nonce (24 bytes) || ciphertext || tag (16 bytes)`. The chunk
/// index is bound as associated data, so a sealed chunk replayed at a
/// different position fails authentication.
#[derive(Clone)]
pub struct ChunkCipher {
    key: Key,
}

impl ChunkCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Key::from(key),
        }
    }

    /// Parse a 64-character hex key, as carried in configuration.
    pub fn from_hex(s: &str) -> Result<Self, ChunkError> {
        let bytes = hex::decode(s.trim()).map_err(|_| ChunkError::InvalidKey)?;
        let key: [u8; 32] = bytes.try_into().map_err(|_| ChunkError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// Encrypt one chunk into its sealed envelope.
    pub fn seal(&self, chunk: &Chunk) -> Result<Vec<u8>, ChunkError> {
        let aead = XChaCha20Poly1305::new(&self.key);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from(nonce_bytes);

        let ciphertext = aead
            .encrypt(
                &nonce,
                Payload {
                    msg: &chunk.data,
                    aad: &chunk.index.to_le_bytes(),
                },
            )
            .map_err(|_| ChunkError::Integrity { index: chunk.index })?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a sealed envelope back into the chunk at `index`.
    ///
    /// Fails with [`ChunkError::Integrity`] on truncation, tampering or a
    /// wrong key; corrupted plaintext is never returned.
    pub fn open(&self, index: u32, sealed: &[u8]) -> Result<Chunk, ChunkError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(ChunkError::Integrity { index });
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let aead = XChaCha20Poly1305::new(&self.key);
        let data = aead
            .decrypt(
                XNonce::from_slice(nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: &index.to_le_bytes(),
                },
            )
            .map_err(|_| ChunkError::Integrity { index })?;

        Ok(Chunk { index, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> ChunkCipher {
        ChunkCipher::new([42u8; 32])
    }

    fn chunk(index: u32, data: &[u8]) -> Chunk {
        Chunk {
            index,
            data: data.to_vec(),
        }
    }

    #[test]
    fn seal_open_round_trip() {
        let c = chunk(3, b"some plaintext bytes");
        let sealed = cipher().seal(&c).unwrap();
        let opened = cipher().open(3, &sealed).unwrap();
        assert_eq!(opened, c);
    }

    #[test]
    fn sealed_envelope_has_expected_overhead() {
        let c = chunk(0, &[0u8; 100]);
        let sealed = cipher().seal(&c).unwrap();
        assert_eq!(sealed.len(), 100 + NONCE_LEN + TAG_LEN);
    }

    #[test]
    fn nonces_are_unique_per_seal() {
        let c = chunk(0, b"same input");
        let a = cipher().seal(&c).unwrap();
        let b = cipher().seal(&c).unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails_integrity() {
        let sealed = cipher().seal(&chunk(1, b"secret")).unwrap();
        let other = ChunkCipher::new([7u8; 32]);
        assert!(matches!(
            other.open(1, &sealed),
            Err(ChunkError::Integrity { index: 1 })
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_integrity() {
        let mut sealed = cipher().seal(&chunk(2, b"secret")).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(matches!(
            cipher().open(2, &sealed),
            Err(ChunkError::Integrity { index: 2 })
        ));
    }

    #[test]
    fn wrong_index_fails_integrity() {
        // Index is associated data: a chunk replayed at another position must
        // not authenticate.
        let sealed = cipher().seal(&chunk(4, b"positioned")).unwrap();
        assert!(cipher().open(5, &sealed).is_err());
    }

    #[test]
    fn truncated_envelope_fails_integrity() {
        let sealed = cipher().seal(&chunk(0, b"short")).unwrap();
        assert!(cipher().open(0, &sealed[..NONCE_LEN + TAG_LEN - 1]).is_err());
    }

    #[test]
    fn from_hex_accepts_32_byte_keys_only() {
        assert!(ChunkCipher::from_hex(&"ab".repeat(32)).is_ok());
        assert!(ChunkCipher::from_hex("abcd").is_err());
        assert!(ChunkCipher::from_hex(&"zz".repeat(32)).is_err());
    }
}
