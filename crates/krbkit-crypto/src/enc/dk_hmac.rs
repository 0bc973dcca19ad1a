//! The RFC 3961 simplified profile: derive per-usage keys, HMAC the
//! plaintext, encrypt under a separate key (des3-cbc-sha1 and the
//! aes-cts-hmac-sha1-96 family).

use subtle::ConstantTimeEq;

use super::{check_frame, fill_random};
use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::hmac::hmac;
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
    let hash = profile
        .hash
        .ok_or(Error::Internal("derived-key HMAC enctype without a hash"))?;

    let ki = derive_key(key, &usage_constant(usage, SEED_INTEGRITY), profile.derive_alg)?;
    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;

    fill_random(iovs[header].data)?;

    // The MAC covers the plaintext (confounder, payload, padding and any
    // sign-only regions); the trailer itself stays outside the cipher walk.
    let tag = hmac(hash, ki.contents(), &sign_parts(iovs))?;
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
    let hash = profile
        .hash
        .ok_or(Error::Internal("derived-key HMAC enctype without a hash"))?;

    let ki = derive_key(key, &usage_constant(usage, SEED_INTEGRITY), profile.derive_alg)?;
    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;

    profile.enc.decrypt(ke.keyblock(), ivec, iovs)?;

    let tag = hmac(hash, ki.contents(), &sign_parts(iovs))?;
    if bool::from(tag[..profile.tag_len].ct_eq(iovs[trailer].data)) {
        Ok(())
    } else {
        Err(Error::Integrity)
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{decrypt, encrypt};
    use crate::enctype::{ENCTYPE_AES128_CTS_HMAC_SHA1_96, ENCTYPE_DES3_CBC_SHA1};
    use crate::error::Error;
    use crate::key::{Key, Keyblock};

    fn key(etype: i32, len: usize) -> Key {
        Key::new(crate::dispatch::random_to_key(etype, &vec![0x3c; len]).unwrap())
    }

    #[test]
    fn aes_roundtrip_across_lengths() {
        let k = Key::new(
            Keyblock::new(ENCTYPE_AES128_CTS_HMAC_SHA1_96, vec![0x42; 16]).unwrap(),
        );
        for len in [0usize, 1, 15, 16, 17, 31, 32, 33, 100] {
            let plain: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let blob = encrypt(&k, 5, &plain).unwrap();
            if len > 0 {
                assert_ne!(&blob[16..16 + len], &plain[..], "length {len}");
            }
            assert_eq!(decrypt(&k, 5, &blob).unwrap(), plain);
        }
    }

    #[test]
    fn des3_roundtrip_pads_to_block() {
        let k = key(ENCTYPE_DES3_CBC_SHA1, 21);
        let plain = b"attack at dawn".to_vec();
        let blob = encrypt(&k, 11, &plain).unwrap();
        // 8 confounder + payload padded to 8 + 20 trailer.
        assert_eq!(blob.len(), 8 + 16 + 20);
        let out = decrypt(&k, 11, &blob).unwrap();
        assert_eq!(&out[..plain.len()], &plain[..]);
        assert!(out[plain.len()..].iter().all(|&b| b == 0), "zero padding");
    }

    #[test]
    fn wrong_usage_fails_integrity() {
        let k = key(ENCTYPE_AES128_CTS_HMAC_SHA1_96, 16);
        let blob = encrypt(&k, 5, b"secret").unwrap();
        assert!(matches!(decrypt(&k, 6, &blob), Err(Error::Integrity)));
    }

    #[test]
    fn bit_flips_anywhere_fail_integrity() {
        let k = key(ENCTYPE_AES128_CTS_HMAC_SHA1_96, 16);
        let blob = encrypt(&k, 5, b"tamper with me").unwrap();
        for pos in [0, 16, blob.len() - 1] {
            let mut bad = blob.clone();
            bad[pos] ^= 0x40;
            assert!(matches!(decrypt(&k, 5, &bad), Err(Error::Integrity)), "byte {pos}");
        }
    }
}
