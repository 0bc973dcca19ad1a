//! The checksum-type registry.
//!
//! Mirrors the enctype registry: one static row per checksum type, carrying
//! the hash or cipher backend, the derivation algorithm for keyed types,
//! full vs. truncated output lengths, and the enctypes whose keys the type
//! accepts. Computation and verification live in `checksum`.

use crate::checksum;
use crate::enctype::{
    ENCTYPE_ARCFOUR_HMAC, ENCTYPE_ARCFOUR_HMAC_EXP, ENCTYPE_AES128_CTS_HMAC_SHA1_96,
    ENCTYPE_AES128_CTS_HMAC_SHA256_128, ENCTYPE_AES256_CTS_HMAC_SHA1_96,
    ENCTYPE_AES256_CTS_HMAC_SHA384_192, ENCTYPE_CAMELLIA128_CTS_CMAC,
    ENCTYPE_CAMELLIA256_CTS_CMAC, ENCTYPE_DES3_CBC_RAW, ENCTYPE_DES3_CBC_SHA1,
    ENCTYPE_DES_CBC_CRC, ENCTYPE_DES_CBC_MD4, ENCTYPE_DES_CBC_MD5, ENCTYPE_DES_CBC_RAW,
};
use crate::error::{Error, Result};
use crate::kdf::DeriveAlg;
use crate::key::Key;
use crate::provider::{EncProvider, HashProvider};
use crate::providers::{
    Camellia128Cts, Camellia256Cts, Md4Hash, Md5Hash, Sha1Hash, Sha256Hash, Sha384Hash,
};

pub const CKSUMTYPE_CRC32: i32 = 1;
pub const CKSUMTYPE_RSA_MD4: i32 = 2;
pub const CKSUMTYPE_RSA_MD4_DES: i32 = 3;
pub const CKSUMTYPE_RSA_MD5: i32 = 7;
pub const CKSUMTYPE_RSA_MD5_DES: i32 = 8;
pub const CKSUMTYPE_HMAC_SHA1_DES3: i32 = 12;
pub const CKSUMTYPE_SHA1: i32 = 14;
pub const CKSUMTYPE_HMAC_SHA1_96_AES128: i32 = 15;
pub const CKSUMTYPE_HMAC_SHA1_96_AES256: i32 = 16;
pub const CKSUMTYPE_CMAC_CAMELLIA128: i32 = 17;
pub const CKSUMTYPE_CMAC_CAMELLIA256: i32 = 18;
pub const CKSUMTYPE_HMAC_SHA256_128_AES128: i32 = 19;
pub const CKSUMTYPE_HMAC_SHA384_192_AES256: i32 = 20;
pub const CKSUMTYPE_HMAC_MD5_ARCFOUR: i32 = -138;

/// No key material is involved; anyone can recompute the sum.
pub const CKSUM_UNKEYED: u32 = 1 << 0;
/// The underlying digest no longer resists collisions.
pub const CKSUM_NOT_COLLISION_PROOF: u32 = 1 << 1;

pub(crate) type ComputeFn =
    fn(&ChecksumProfile, Option<&Key>, u32, &[&[u8]]) -> Result<Vec<u8>>;

pub(crate) type VerifyFn = fn(&ChecksumProfile, &Key, u32, &[&[u8]], &[u8]) -> Result<bool>;

pub struct ChecksumProfile {
    pub cktype: i32,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub hash: Option<&'static dyn HashProvider>,
    pub(crate) enc: Option<&'static dyn EncProvider>,
    /// Full digest length produced by `compute`.
    pub compute_size: usize,
    /// Wire length after truncation.
    pub output_size: usize,
    pub flags: u32,
    /// Enctypes whose keys this type accepts; empty for unkeyed types.
    pub key_enctypes: &'static [i32],
    pub(crate) derive_alg: Option<DeriveAlg>,
    pub(crate) compute: ComputeFn,
    /// Types whose output embeds a random confounder cannot be verified by
    /// recomputation and carry their own verifier.
    pub(crate) verify: Option<VerifyFn>,
}

const DES_ENCTYPES: &[i32] = &[
    ENCTYPE_DES_CBC_CRC,
    ENCTYPE_DES_CBC_MD4,
    ENCTYPE_DES_CBC_MD5,
    ENCTYPE_DES_CBC_RAW,
];

static CKSUMTYPES: [ChecksumProfile; 14] = [
    ChecksumProfile {
        cktype: CKSUMTYPE_CRC32,
        name: "crc32",
        aliases: &[],
        hash: None,
        enc: None,
        compute_size: 4,
        output_size: 4,
        flags: CKSUM_UNKEYED | CKSUM_NOT_COLLISION_PROOF,
        key_enctypes: &[],
        derive_alg: None,
        compute: checksum::compute_crc32,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_RSA_MD4,
        name: "md4",
        aliases: &["rsa-md4"],
        hash: Some(&Md4Hash),
        enc: None,
        compute_size: 16,
        output_size: 16,
        flags: CKSUM_UNKEYED | CKSUM_NOT_COLLISION_PROOF,
        key_enctypes: &[],
        derive_alg: None,
        compute: checksum::compute_unkeyed_hash,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_RSA_MD4_DES,
        name: "md4-des",
        aliases: &["rsa-md4-des"],
        hash: Some(&Md4Hash),
        enc: None,
        compute_size: 24,
        output_size: 24,
        flags: 0,
        key_enctypes: DES_ENCTYPES,
        derive_alg: None,
        compute: checksum::compute_des_enc,
        verify: Some(checksum::verify_des_enc),
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_RSA_MD5,
        name: "md5",
        aliases: &["rsa-md5"],
        hash: Some(&Md5Hash),
        enc: None,
        compute_size: 16,
        output_size: 16,
        flags: CKSUM_UNKEYED | CKSUM_NOT_COLLISION_PROOF,
        key_enctypes: &[],
        derive_alg: None,
        compute: checksum::compute_unkeyed_hash,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_RSA_MD5_DES,
        name: "md5-des",
        aliases: &["rsa-md5-des"],
        hash: Some(&Md5Hash),
        enc: None,
        compute_size: 24,
        output_size: 24,
        flags: 0,
        key_enctypes: DES_ENCTYPES,
        derive_alg: None,
        compute: checksum::compute_des_enc,
        verify: Some(checksum::verify_des_enc),
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_SHA1_DES3,
        name: "hmac-sha1-des3",
        aliases: &["hmac-sha1-des3-kd"],
        hash: Some(&Sha1Hash),
        enc: None,
        compute_size: 20,
        output_size: 20,
        flags: 0,
        key_enctypes: &[ENCTYPE_DES3_CBC_RAW, ENCTYPE_DES3_CBC_SHA1],
        derive_alg: Some(DeriveAlg::Rfc3961),
        compute: checksum::compute_dk_hmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_SHA1,
        name: "sha1",
        aliases: &["sha"],
        hash: Some(&Sha1Hash),
        enc: None,
        compute_size: 20,
        output_size: 20,
        flags: CKSUM_UNKEYED,
        key_enctypes: &[],
        derive_alg: None,
        compute: checksum::compute_unkeyed_hash,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_SHA1_96_AES128,
        name: "hmac-sha1-96-aes128",
        aliases: &[],
        hash: Some(&Sha1Hash),
        enc: None,
        compute_size: 20,
        output_size: 12,
        flags: 0,
        key_enctypes: &[ENCTYPE_AES128_CTS_HMAC_SHA1_96],
        derive_alg: Some(DeriveAlg::Rfc3961),
        compute: checksum::compute_dk_hmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_SHA1_96_AES256,
        name: "hmac-sha1-96-aes256",
        aliases: &[],
        hash: Some(&Sha1Hash),
        enc: None,
        compute_size: 20,
        output_size: 12,
        flags: 0,
        key_enctypes: &[ENCTYPE_AES256_CTS_HMAC_SHA1_96],
        derive_alg: Some(DeriveAlg::Rfc3961),
        compute: checksum::compute_dk_hmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_CMAC_CAMELLIA128,
        name: "cmac-camellia128",
        aliases: &[],
        hash: None,
        enc: Some(&Camellia128Cts),
        compute_size: 16,
        output_size: 16,
        flags: 0,
        key_enctypes: &[ENCTYPE_CAMELLIA128_CTS_CMAC],
        derive_alg: Some(DeriveAlg::Sp800_108FeedbackCmac),
        compute: checksum::compute_dk_cmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_CMAC_CAMELLIA256,
        name: "cmac-camellia256",
        aliases: &[],
        hash: None,
        enc: Some(&Camellia256Cts),
        compute_size: 16,
        output_size: 16,
        flags: 0,
        key_enctypes: &[ENCTYPE_CAMELLIA256_CTS_CMAC],
        derive_alg: Some(DeriveAlg::Sp800_108FeedbackCmac),
        compute: checksum::compute_dk_cmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_SHA256_128_AES128,
        name: "hmac-sha256-128-aes128",
        aliases: &[],
        hash: Some(&Sha256Hash),
        enc: None,
        compute_size: 32,
        output_size: 16,
        flags: 0,
        key_enctypes: &[ENCTYPE_AES128_CTS_HMAC_SHA256_128],
        derive_alg: Some(DeriveAlg::Sp800_108CounterHmac),
        compute: checksum::compute_dk_hmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_SHA384_192_AES256,
        name: "hmac-sha384-192-aes256",
        aliases: &[],
        hash: Some(&Sha384Hash),
        enc: None,
        compute_size: 48,
        output_size: 24,
        flags: 0,
        key_enctypes: &[ENCTYPE_AES256_CTS_HMAC_SHA384_192],
        derive_alg: Some(DeriveAlg::Sp800_108CounterHmac),
        compute: checksum::compute_dk_hmac,
        verify: None,
    },
    ChecksumProfile {
        cktype: CKSUMTYPE_HMAC_MD5_ARCFOUR,
        name: "hmac-md5-arcfour",
        aliases: &["hmac-md5-rc4", "hmac-md5-enc"],
        hash: Some(&Md5Hash),
        enc: None,
        compute_size: 16,
        output_size: 16,
        flags: 0,
        key_enctypes: &[ENCTYPE_ARCFOUR_HMAC, ENCTYPE_ARCFOUR_HMAC_EXP],
        derive_alg: None,
        compute: checksum::compute_hmac_md5_arcfour,
        verify: None,
    },
];

pub fn find_cksumtype(cktype: i32) -> Result<&'static ChecksumProfile> {
    CKSUMTYPES
        .iter()
        .find(|p| p.cktype == cktype)
        .ok_or(Error::BadCksumtype(cktype))
}

pub fn find_cksumtype_by_name(name: &str) -> Result<&'static ChecksumProfile> {
    CKSUMTYPES
        .iter()
        .find(|p| {
            p.name.eq_ignore_ascii_case(name)
                || p.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
        .ok_or(Error::BadCksumtype(0))
}

pub fn cksumtype_list() -> impl Iterator<Item = &'static ChecksumProfile> {
    CKSUMTYPES.iter()
}

impl ChecksumProfile {
    pub fn is_keyed(&self) -> bool {
        !self.key_enctypes.is_empty()
    }

    /// A key is usable with this type when its enctype is in the compat
    /// list. Unkeyed types accept (and ignore) any key.
    pub(crate) fn check_key(&self, key: Option<&Key>) -> Result<()> {
        if !self.is_keyed() {
            return Ok(());
        }
        let key = key.ok_or(Error::InvalidParameter("checksum type requires a key"))?;
        if self.key_enctypes.contains(&key.enctype()) {
            Ok(())
        } else {
            Err(Error::BadEnctype(key.enctype()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Keyblock;

    #[test]
    fn lookup_by_number_and_name_agree() {
        for p in cksumtype_list() {
            assert_eq!(find_cksumtype(p.cktype).unwrap().cktype, p.cktype);
            assert_eq!(find_cksumtype_by_name(p.name).unwrap().cktype, p.cktype);
        }
        assert!(matches!(find_cksumtype(999), Err(Error::BadCksumtype(999))));
    }

    #[test]
    fn truncation_never_exceeds_computation() {
        for p in cksumtype_list() {
            assert!(p.output_size <= p.compute_size);
        }
    }

    #[test]
    fn key_compat_is_enforced() {
        let p = find_cksumtype(CKSUMTYPE_HMAC_SHA1_96_AES128).unwrap();
        let aes = Key::new(
            Keyblock::new(ENCTYPE_AES128_CTS_HMAC_SHA1_96, vec![1; 16]).unwrap(),
        );
        let rc4 = Key::new(Keyblock::new(ENCTYPE_ARCFOUR_HMAC, vec![1; 16]).unwrap());
        assert!(p.check_key(Some(&aes)).is_ok());
        assert!(matches!(
            p.check_key(Some(&rc4)),
            Err(Error::BadEnctype(ENCTYPE_ARCFOUR_HMAC))
        ));
        assert!(p.check_key(None).is_err());
        let unkeyed = find_cksumtype(CKSUMTYPE_SHA1).unwrap();
        assert!(unkeyed.check_key(None).is_ok());
    }
}
