//! Arcfour stream provider (RFC 4757 enctype family).
//!
//! One keystream runs across all encryption-relevant segments in list
//! order, so scattering a message does not change the ciphertext.

use cipher::consts::U16;
use cipher::{KeyInit, StreamCipher};
use rc4::Rc4;

use crate::error::{Error, Result};
use crate::iov::CryptoIov;
use crate::key::Keyblock;
use crate::provider::EncProvider;

pub struct ArcfourStream;

impl ArcfourStream {
    fn keystream(key: &Keyblock, iovs: &mut [CryptoIov<'_>]) -> Result<()> {
        let mut rc4 =
            Rc4::<U16>::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)?;
        for iov in iovs.iter_mut() {
            if iov.kind.is_encrypted() {
                rc4.apply_keystream(iov.data);
            }
        }
        Ok(())
    }
}

impl EncProvider for ArcfourStream {
    fn block_size(&self) -> usize {
        1
    }

    fn keybytes(&self) -> usize {
        16
    }

    fn keylength(&self) -> usize {
        16
    }

    fn encrypt(
        &self,
        key: &Keyblock,
        _ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        Self::keystream(key, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        _ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        Self::keystream(key, iovs)
    }

    fn init_state(&self) -> Vec<u8> {
        Vec::new()
    }
}
