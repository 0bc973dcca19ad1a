//! Bundled primitive backends (RustCrypto-based).

mod aes;
mod camellia;
pub(crate) mod cbc;
mod des;
mod hash;
mod rc4;

pub use aes::{Aes128Cts, Aes256Cts};
pub use camellia::{Camellia128Cts, Camellia256Cts};
pub use des::{DesCbc, Des3Cbc};
pub use hash::{Md4Hash, Md5Hash, Sha1Hash, Sha256Hash, Sha384Hash};
pub use rc4::ArcfourStream;

pub(crate) use des::fix_key;

use crate::error::{Error, Result};

/// A supplied cipher state must be exactly one block.
pub(crate) fn check_ivec(ivec: &Option<&mut [u8]>, block_size: usize) -> Result<()> {
    match ivec {
        Some(iv) if iv.len() != block_size => Err(Error::BadMessageSize),
        _ => Ok(()),
    }
}
