//! AES-128/256 in CBC-CTS mode (RFC 3962 and RFC 8009 enctype families).

use aes::{Aes128, Aes256};
use cipher::KeyInit;

use super::cbc::{cbc_mac, cts_decrypt, cts_encrypt};
use super::check_ivec;
use crate::error::{Error, Result};
use crate::iov::CryptoIov;
use crate::key::Keyblock;
use crate::provider::EncProvider;

pub struct Aes128Cts;
pub struct Aes256Cts;

fn aes128(key: &Keyblock) -> Result<Aes128> {
    Aes128::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

fn aes256(key: &Keyblock) -> Result<Aes256> {
    Aes256::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

impl EncProvider for Aes128Cts {
    fn block_size(&self) -> usize {
        16
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
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_encrypt(&aes128(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_decrypt(&aes128(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&aes128(key)?, data, ivec, out)
    }
}

impl EncProvider for Aes256Cts {
    fn block_size(&self) -> usize {
        16
    }

    fn keybytes(&self) -> usize {
        32
    }

    fn keylength(&self) -> usize {
        32
    }

    fn encrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_encrypt(&aes256(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_decrypt(&aes256(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&aes256(key)?, data, ivec, out)
    }
}
