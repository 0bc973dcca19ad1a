//! Legacy single-DES scheme: confounder and plaintext checksum share the
//! header, everything is encrypted under the bare key, and the key usage
//! number plays no part. des-cbc-crc additionally seeds the cipher state
//! from the key itself.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::fill_random;
use crate::crc32::mod_crc32;
use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::iov::{locate, sign_parts, validate_shape, CryptoIov, IovKind};
use crate::key::Key;

fn plaintext_cksum(
    profile: &EnctypeProfile,
    iovs: &[CryptoIov<'_>],
    crc: bool,
) -> Result<Vec<u8>> {
    let parts = sign_parts(iovs);
    if crc {
        Ok(mod_crc32(&parts).to_vec())
    } else {
        let hash = profile
            .hash
            .ok_or(Error::Internal("legacy enctype without a checksum hash"))?;
        let mut out = vec![0u8; hash.hash_size()];
        hash.hash(&parts, &mut out)?;
        Ok(out)
    }
}

/// Run the cipher with the des-cbc-crc key-as-IV quirk applied when the
/// caller did not supply a chaining state.
fn run_cipher(
    profile: &EnctypeProfile,
    key: &Key,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
    decrypting: bool,
) -> Result<()> {
    let mut keyiv;
    let ivec = match ivec {
        None if profile.iv_from_key => {
            keyiv = Zeroizing::new(key.contents().to_vec());
            Some(&mut keyiv[..])
        }
        other => other,
    };
    if decrypting {
        profile.enc.decrypt(key.keyblock(), ivec, iovs)
    } else {
        profile.enc.encrypt(key.keyblock(), ivec, iovs)
    }
}

fn encrypt_common(
    profile: &EnctypeProfile,
    key: &Key,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
    crc: bool,
) -> Result<()> {
    validate_shape(iovs)?;
    let header = locate(iovs, IovKind::Header)?;
    let bs = profile.enc.block_size();
    if iovs[header].data.len() != bs + profile.tag_len {
        return Err(Error::BadMessageSize);
    }

    // Checksum the plaintext with the checksum field zeroed, then drop the
    // sum into place and encrypt the lot.
    fill_random(&mut iovs[header].data[..bs])?;
    iovs[header].data[bs..].fill(0);
    let cksum = plaintext_cksum(profile, iovs, crc)?;
    iovs[header].data[bs..].copy_from_slice(&cksum);

    run_cipher(profile, key, ivec, iovs, false)
}

fn decrypt_common(
    profile: &EnctypeProfile,
    key: &Key,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
    crc: bool,
) -> Result<()> {
    validate_shape(iovs)?;
    let header = locate(iovs, IovKind::Header)?;
    let bs = profile.enc.block_size();
    if iovs[header].data.len() != bs + profile.tag_len {
        return Err(Error::BadMessageSize);
    }

    run_cipher(profile, key, ivec, iovs, true)?;

    let stored = iovs[header].data[bs..].to_vec();
    iovs[header].data[bs..].fill(0);
    let expect = plaintext_cksum(profile, iovs, crc)?;
    if bool::from(expect.ct_eq(&stored)) {
        Ok(())
    } else {
        Err(Error::Integrity)
    }
}

pub(crate) fn encrypt_crc32(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    encrypt_common(profile, key, ivec, iovs, true)
}

pub(crate) fn decrypt_crc32(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    decrypt_common(profile, key, ivec, iovs, true)
}

pub(crate) fn encrypt_hash(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    encrypt_common(profile, key, ivec, iovs, false)
}

pub(crate) fn decrypt_hash(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    decrypt_common(profile, key, ivec, iovs, false)
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{decrypt, encrypt};
    use crate::enctype::{
        ENCTYPE_DES_CBC_CRC, ENCTYPE_DES_CBC_MD4, ENCTYPE_DES_CBC_MD5,
    };
    use crate::error::Error;
    use crate::key::Key;

    fn key(etype: i32) -> Key {
        Key::new(crate::dispatch::random_to_key(etype, &[0x21; 7]).unwrap())
    }

    #[test]
    fn legacy_variants_roundtrip() {
        for (etype, overhead) in [
            (ENCTYPE_DES_CBC_CRC, 8 + 4),
            (ENCTYPE_DES_CBC_MD4, 8 + 16),
            (ENCTYPE_DES_CBC_MD5, 8 + 16),
        ] {
            let k = key(etype);
            let plain = b"kerberos v4 leftovers".to_vec();
            let blob = encrypt(&k, 0, &plain).unwrap();
            assert_eq!(blob.len() % 8, 0, "CBC output is block aligned");
            assert!(blob.len() >= overhead + plain.len());
            let out = decrypt(&k, 0, &blob).unwrap();
            assert_eq!(&out[..plain.len()], &plain[..]);
        }
    }

    #[test]
    fn usage_is_ignored() {
        let k = key(ENCTYPE_DES_CBC_MD5);
        let blob = encrypt(&k, 1, b"no usage binding").unwrap();
        let out = decrypt(&k, 99, &blob).unwrap();
        assert_eq!(&out[..16], b"no usage binding");
    }

    #[test]
    fn corrupted_payload_fails_integrity() {
        let k = key(ENCTYPE_DES_CBC_CRC);
        let mut blob = encrypt(&k, 0, b"fragile").unwrap();
        blob[14] ^= 0x04;
        assert!(matches!(decrypt(&k, 0, &blob), Err(Error::Integrity)));
    }

    #[test]
    fn repeated_encryption_never_repeats() {
        let crc = key(ENCTYPE_DES_CBC_CRC);
        let plain = [0u8; 8];
        let a = encrypt(&crc, 0, &plain).unwrap();
        let b = encrypt(&crc, 0, &plain).unwrap();
        assert_ne!(a, b, "confounder randomizes every message");
    }
}
