//! Capability interfaces for the swappable primitive backends.
//!
//! The framework never touches a cipher or digest implementation directly;
//! everything goes through these two traits. The bundled backends (see
//! `providers`) are built on the RustCrypto crates, but any implementation
//! honoring the contracts below can be slotted into the registry.

use crate::error::{Error, Result};
use crate::iov::CryptoIov;
use crate::key::Keyblock;

/// A block (or stream) cipher in the chaining mode its enctype family uses:
/// CBC with ciphertext stealing for AES/Camellia, plain CBC for DES/3DES,
/// raw keystream for arcfour.
///
/// `encrypt`/`decrypt` walk the encryption-relevant segments of the envelope
/// and transform them in place, updating `ivec` (the evolving cipher state)
/// when one is supplied.
pub trait EncProvider: Sync {
    /// Cipher block size in bytes; 1 for stream ciphers.
    fn block_size(&self) -> usize;

    /// Pseudo-random seed length consumed by random-to-key.
    fn keybytes(&self) -> usize;

    /// Length of a finished protocol key.
    fn keylength(&self) -> usize;

    fn encrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()>;

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()>;

    /// CBC-MAC over the concatenation of `data`, whose total length must be
    /// a block multiple. Writes the final chaining block to `out`. Optional:
    /// only block ciphers backing a CMAC or legacy MAC construction carry it.
    fn cbc_mac(
        &self,
        _key: &Keyblock,
        _data: &[&[u8]],
        _ivec: Option<&[u8]>,
        _out: &mut [u8],
    ) -> Result<()> {
        Err(Error::Internal("cipher does not provide a CBC-MAC"))
    }

    /// Initial cipher state for an IV-chained sequence of messages.
    fn init_state(&self) -> Vec<u8> {
        vec![0; self.block_size()]
    }
}

/// An unkeyed hash function. `data` is hashed as one logical stream in list
/// order; `out` must be exactly `hash_size` bytes.
pub trait HashProvider: Sync {
    fn name(&self) -> &'static str;

    /// Digest length in bytes.
    fn hash_size(&self) -> usize;

    /// Internal message block length in bytes (the HMAC pad width).
    fn block_size(&self) -> usize;

    fn hash(&self, data: &[&[u8]], out: &mut [u8]) -> Result<()>;
}
