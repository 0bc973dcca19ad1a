//! Per-enctype pseudo-random functions (RFC 3961 §5 and successors).

use zeroize::Zeroizing;

use crate::cmac::cmac;
use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::hmac::hmac;
use crate::iov::{CryptoIov, IovKind};
use crate::kdf::{derive_key, sp800_108_counter_hmac, DeriveAlg};
use crate::key::Key;
use crate::providers::Sha1Hash;

/// RFC 3961 simplified-profile PRF: hash the input, truncate to a block
/// multiple, encrypt under the "prf"-derived key.
pub(crate) fn dk_prf(
    profile: &EnctypeProfile,
    key: &Key,
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let hash = profile.hash.ok_or(Error::Internal("PRF enctype without a hash"))?;
    let bs = profile.enc.block_size();
    let mut digest = Zeroizing::new(vec![0u8; hash.hash_size()]);
    hash.hash(&[input], &mut digest)?;
    digest.truncate(hash.hash_size() - hash.hash_size() % bs);

    let kp = derive_key(key, b"prf", DeriveAlg::Rfc3961)?;
    let mut iovs = [CryptoIov::new(IovKind::Data, &mut digest)];
    profile.enc.encrypt(kp.keyblock(), None, &mut iovs)?;
    out.copy_from_slice(&digest[..out.len()]);
    Ok(())
}

/// RFC 6803: CMAC under the "prf"-derived key.
pub(crate) fn cmac_prf(
    profile: &EnctypeProfile,
    key: &Key,
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let kp = derive_key(key, b"prf", DeriveAlg::Sp800_108FeedbackCmac)?;
    let tag = cmac(profile.enc, kp.keyblock(), &[input])?;
    out.copy_from_slice(&tag[..out.len()]);
    Ok(())
}

/// RFC 8009: one counter-HMAC invocation with label "prf" and the input as
/// context, emitting a full digest.
pub(crate) fn sha2_prf(
    profile: &EnctypeProfile,
    key: &Key,
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let hash = profile.hash.ok_or(Error::Internal("PRF enctype without a hash"))?;
    let prf = sp800_108_counter_hmac(hash, key.contents(), b"prf", input, out.len())?;
    out.copy_from_slice(&prf);
    Ok(())
}

/// RFC 4757 carries no PRF of its own; HMAC-SHA1 over the input is the
/// de facto one.
pub(crate) fn arcfour_prf(
    _profile: &EnctypeProfile,
    key: &Key,
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let tag = hmac(&Sha1Hash, key.contents(), &[input])?;
    out.copy_from_slice(&tag[..out.len()]);
    Ok(())
}

/// Single-DES legacy PRF: MD5 the input and encrypt it under the key.
pub(crate) fn des_prf(
    profile: &EnctypeProfile,
    key: &Key,
    input: &[u8],
    out: &mut [u8],
) -> Result<()> {
    let hash = profile.hash.unwrap_or(&crate::providers::Md5Hash);
    let mut digest = Zeroizing::new(vec![0u8; hash.hash_size()]);
    hash.hash(&[input], &mut digest)?;
    let mut iovs = [CryptoIov::new(IovKind::Data, &mut digest)];
    profile.enc.encrypt(key.keyblock(), None, &mut iovs)?;
    out.copy_from_slice(&digest[..out.len()]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{prf, prf_length, random_to_key};
    use crate::enctype::{
        ENCTYPE_AES128_CTS_HMAC_SHA1_96, ENCTYPE_AES128_CTS_HMAC_SHA256_128,
        ENCTYPE_AES256_CTS_HMAC_SHA384_192, ENCTYPE_ARCFOUR_HMAC,
        ENCTYPE_CAMELLIA128_CTS_CMAC, ENCTYPE_DES3_CBC_SHA1, ENCTYPE_DES_CBC_RAW,
    };
    use crate::error::Error;
    use crate::key::{Key, Keyblock};

    fn key(etype: i32, bytes: &[u8]) -> Key {
        Key::new(Keyblock::new(etype, bytes.to_vec()).unwrap())
    }

    #[test]
    fn rfc8009_prf_vectors() {
        let k128 = key(
            ENCTYPE_AES128_CTS_HMAC_SHA256_128,
            &hex::decode("3705d96080c17728a0e800eab6e0d23c").unwrap(),
        );
        assert_eq!(
            hex::encode(prf(&k128, b"test").unwrap()),
            "9d188616f63852fe86915bb840b4a886ff3e6bb0f819b49b893393d393854295"
        );
        let k256 = key(
            ENCTYPE_AES256_CTS_HMAC_SHA384_192,
            &hex::decode("6d404d37faf79f9df0d33568d320669800eb4836472ea8a026d16b7182460c52")
                .unwrap(),
        );
        assert_eq!(
            hex::encode(prf(&k256, b"test").unwrap()),
            "9801f69a368c2bf675e59521e177d9a07f67efe1cfde8d3c8d6f6a0256e3b17d\
             b3c1b62ad1b8553360d17367eb1514d2"
        );
    }

    #[test]
    fn prf_lengths_match_profiles() {
        for (etype, len) in [
            (ENCTYPE_DES3_CBC_SHA1, 16),
            (ENCTYPE_AES128_CTS_HMAC_SHA1_96, 16),
            (ENCTYPE_CAMELLIA128_CTS_CMAC, 16),
            (ENCTYPE_AES128_CTS_HMAC_SHA256_128, 32),
            (ENCTYPE_AES256_CTS_HMAC_SHA384_192, 48),
            (ENCTYPE_ARCFOUR_HMAC, 20),
        ] {
            assert_eq!(prf_length(etype).unwrap(), len);
        }
    }

    #[test]
    fn prf_is_deterministic_and_input_sensitive() {
        let k = key(ENCTYPE_AES128_CTS_HMAC_SHA1_96, &[0x19; 16]);
        let a = prf(&k, b"input one").unwrap();
        let b = prf(&k, b"input one").unwrap();
        let c = prf(&k, b"input two").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn raw_enctypes_have_no_prf() {
        let k = Key::new(random_to_key(ENCTYPE_DES_CBC_RAW, &[3; 7]).unwrap());
        assert!(matches!(prf(&k, b"x"), Err(Error::InvalidParameter(_))));
    }
}
