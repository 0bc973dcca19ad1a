//! RFC 6803 Camellia family: the simplified profile with CMAC in place of
//! HMAC, key derivation in SP800-108 feedback mode.

use subtle::ConstantTimeEq;

use super::{check_frame, fill_random};
use crate::cmac::cmac;
use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::iov::{sign_parts, CryptoIov};
use crate::kdf::{derive_key, usage_constant, SEED_ENCRYPTION, SEED_INTEGRITY};
use crate::key::Key;

pub(crate) fn encrypt(
    profile: &EnctypeProfile,
    key: &Key,
    usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    let (header, trailer) = check_frame(profile, iovs)?;

    let ki = derive_key(key, &usage_constant(usage, SEED_INTEGRITY), profile.derive_alg)?;
    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;

    fill_random(iovs[header].data)?;

    let tag = cmac(profile.enc, ki.keyblock(), &sign_parts(iovs))?;
    iovs[trailer].data.copy_from_slice(&tag[..profile.tag_len]);

    profile.enc.encrypt(ke.keyblock(), ivec, iovs)
}

pub(crate) fn decrypt(
    profile: &EnctypeProfile,
    key: &Key,
    usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    let (_, trailer) = check_frame(profile, iovs)?;

    let ki = derive_key(key, &usage_constant(usage, SEED_INTEGRITY), profile.derive_alg)?;
    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;

    profile.enc.decrypt(ke.keyblock(), ivec, iovs)?;

    let tag = cmac(profile.enc, ki.keyblock(), &sign_parts(iovs))?;
    if bool::from(tag[..profile.tag_len].ct_eq(iovs[trailer].data)) {
        Ok(())
    } else {
        Err(Error::Integrity)
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{decrypt, encrypt};
    use crate::enctype::{ENCTYPE_CAMELLIA128_CTS_CMAC, ENCTYPE_CAMELLIA256_CTS_CMAC};
    use crate::error::Error;
    use crate::key::{Key, Keyblock};

    #[test]
    fn camellia_roundtrip_both_widths() {
        for (etype, klen) in [
            (ENCTYPE_CAMELLIA128_CTS_CMAC, 16),
            (ENCTYPE_CAMELLIA256_CTS_CMAC, 32),
        ] {
            let k = Key::new(Keyblock::new(etype, vec![0x7e; klen]).unwrap());
            let plain = b"ten plagues".to_vec();
            let blob = encrypt(&k, 3, &plain).unwrap();
            assert_eq!(blob.len(), 16 + plain.len() + 16);
            assert_eq!(decrypt(&k, 3, &blob).unwrap(), plain);
        }
    }

    #[test]
    fn truncated_tag_fails() {
        let k = Key::new(Keyblock::new(ENCTYPE_CAMELLIA128_CTS_CMAC, vec![9; 16]).unwrap());
        let mut blob = encrypt(&k, 3, b"message").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(matches!(decrypt(&k, 3, &blob), Err(Error::Integrity)));
    }
}
