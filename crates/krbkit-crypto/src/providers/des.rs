//! DES and triple-DES in plain CBC, plus the key-quality helpers the DES
//! random-to-key and string-to-key algorithms need (odd parity, the
//! weak/semi-weak key table).

use des::{Des, TdesEde3};
use cipher::KeyInit;

use super::cbc::{cbc_decrypt, cbc_encrypt, cbc_mac};
use super::check_ivec;
use crate::error::{Error, Result};
use crate::iov::CryptoIov;
use crate::key::Keyblock;
use crate::provider::EncProvider;

pub struct DesCbc;
pub struct Des3Cbc;

/// The classic DES weak and semi-weak keys, odd-parity form.
const WEAK_KEYS: [[u8; 8]; 16] = [
    [0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01],
    [0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe, 0xfe],
    [0x1f, 0x1f, 0x1f, 0x1f, 0x0e, 0x0e, 0x0e, 0x0e],
    [0xe0, 0xe0, 0xe0, 0xe0, 0xf1, 0xf1, 0xf1, 0xf1],
    [0x01, 0xfe, 0x01, 0xfe, 0x01, 0xfe, 0x01, 0xfe],
    [0xfe, 0x01, 0xfe, 0x01, 0xfe, 0x01, 0xfe, 0x01],
    [0x1f, 0xe0, 0x1f, 0xe0, 0x0e, 0xf1, 0x0e, 0xf1],
    [0xe0, 0x1f, 0xe0, 0x1f, 0xf1, 0x0e, 0xf1, 0x0e],
    [0x01, 0xe0, 0x01, 0xe0, 0x01, 0xf1, 0x01, 0xf1],
    [0xe0, 0x01, 0xe0, 0x01, 0xf1, 0x01, 0xf1, 0x01],
    [0x1f, 0xfe, 0x1f, 0xfe, 0x0e, 0xfe, 0x0e, 0xfe],
    [0xfe, 0x1f, 0xfe, 0x1f, 0xfe, 0x0e, 0xfe, 0x0e],
    [0x01, 0x1f, 0x01, 0x1f, 0x01, 0x0e, 0x01, 0x0e],
    [0x1f, 0x01, 0x1f, 0x01, 0x0e, 0x01, 0x0e, 0x01],
    [0xe0, 0xfe, 0xe0, 0xfe, 0xf1, 0xfe, 0xf1, 0xfe],
    [0xfe, 0xe0, 0xfe, 0xe0, 0xfe, 0xf1, 0xfe, 0xf1],
];

/// Force the low bit of each byte to make its parity odd.
pub(crate) fn set_odd_parity(key: &mut [u8]) {
    for b in key.iter_mut() {
        let ones = (*b & 0xfe).count_ones();
        *b = (*b & 0xfe) | u8::from(ones % 2 == 0);
    }
}

pub(crate) fn is_weak_key(key: &[u8]) -> bool {
    WEAK_KEYS.iter().any(|w| w == key)
}

/// Parity-correct an 8-byte key and nudge it off the weak-key table, as the
/// DES string-to-key and random-to-key algorithms require.
pub(crate) fn fix_key(key: &mut [u8]) {
    set_odd_parity(key);
    if is_weak_key(key) {
        key[7] ^= 0xf0;
    }
}

fn des(key: &Keyblock) -> Result<Des> {
    Des::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

fn des3(key: &Keyblock) -> Result<TdesEde3> {
    TdesEde3::new_from_slice(key.contents()).map_err(|_| Error::BadKeySize)
}

impl EncProvider for DesCbc {
    fn block_size(&self) -> usize {
        8
    }

    fn keybytes(&self) -> usize {
        7
    }

    fn keylength(&self) -> usize {
        8
    }

    fn encrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 8)?;
        cbc_encrypt(&des(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 8)?;
        cbc_decrypt(&des(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&des(key)?, data, ivec, out)
    }
}

impl EncProvider for Des3Cbc {
    fn block_size(&self) -> usize {
        8
    }

    fn keybytes(&self) -> usize {
        21
    }

    fn keylength(&self) -> usize {
        24
    }

    fn encrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 8)?;
        cbc_encrypt(&des3(key)?, ivec, iovs)
    }

    fn decrypt(
        &self,
        key: &Keyblock,
        ivec: Option<&mut [u8]>,
        iovs: &mut [CryptoIov<'_>],
    ) -> Result<()> {
        check_ivec(&ivec, 8)?;
        cbc_decrypt(&des3(key)?, ivec, iovs)
    }

    fn cbc_mac(
        &self,
        key: &Keyblock,
        data: &[&[u8]],
        ivec: Option<&[u8]>,
        out: &mut [u8],
    ) -> Result<()> {
        cbc_mac(&des3(key)?, data, ivec, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enctype::ENCTYPE_DES_CBC_MD5;
    use crate::iov::IovKind;

    #[test]
    fn parity_is_odd_after_fixup() {
        let mut key = [0u8; 8];
        set_odd_parity(&mut key);
        assert_eq!(key, [1u8; 8]);
        for b in key {
            assert_eq!(b.count_ones() % 2, 1);
        }
    }

    #[test]
    fn weak_keys_are_nudged() {
        let mut key = [0x01u8; 8];
        fix_key(&mut key);
        assert!(!is_weak_key(&key));
        // The nudge keeps odd parity: 0x01 ^ 0xf0 = 0xf1 has five bits set.
        assert_eq!(key[7], 0xf1);
    }

    #[test]
    fn cbc_requires_block_multiple() {
        let kb = Keyblock::raw(ENCTYPE_DES_CBC_MD5, vec![0x13; 8]);
        let mut buf = [0u8; 12];
        let mut iovs = [CryptoIov::new(IovKind::Data, &mut buf)];
        assert!(matches!(
            DesCbc.encrypt(&kb, None, &mut iovs),
            Err(Error::BadMessageSize)
        ));
    }

    #[test]
    fn cbc_roundtrip() {
        let kb = Keyblock::raw(ENCTYPE_DES_CBC_MD5, vec![0x13; 8]);
        let plain = [0x5au8; 24];
        let mut buf = plain;
        let mut iovs = [CryptoIov::new(IovKind::Data, &mut buf)];
        DesCbc.encrypt(&kb, None, &mut iovs).unwrap();
        assert_ne!(buf, plain);
        let mut iovs = [CryptoIov::new(IovKind::Data, &mut buf)];
        DesCbc.decrypt(&kb, None, &mut iovs).unwrap();
        assert_eq!(buf, plain);
    }
}
