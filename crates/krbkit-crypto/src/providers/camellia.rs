//! Camellia-128/256 in CBC-CTS mode (RFC 6803 enctype family).

use camellia::{Camellia128, Camellia256};
use cipher::KeyInit;

use super::cbc::{cbc_mac, cts_decrypt, cts_encrypt};
use super::check_ivec;
use crate::error::{Error, Result};
use crate::iov::CryptoIov;
use crate::key::Keyblock;
use crate::provider::EncProvider;

pub struct Camellia128Cts;
pub struct Camellia256Cts;

fn cam128(key: &Keyblock) -> Result<Camellia128> {
    Camellia128::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

fn cam256(key: &Keyblock) -> Result<Camellia256> {
    Camellia256::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

impl EncProvider for Camellia128Cts {
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
        cts_encrypt(&cam128(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_decrypt(&cam128(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&cam128(key)?, data, ivec, out)
    }
}

impl EncProvider for Camellia256Cts {
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
        cts_encrypt(&cam256(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 16)?;
        cts_decrypt(&cam256(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&cam256(key)?, data, ivec, out)
    }
}
