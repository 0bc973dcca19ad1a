//! The enctype registry.
//!
//! Every supported encryption type is one static `EnctypeProfile` row wiring
//! a cipher backend, an optional hash, a key-derivation algorithm, and the
//! composite encrypt/decrypt scheme together with its framing lengths.
//! Lookup is by number or by (case-insensitive) name and alias.

use crate::enc;
use crate::error::{Error, Result};
use crate::iov::IovKind;
use crate::kdf::DeriveAlg;
use crate::key::{Key, Keyblock};
use crate::prf;
use crate::provider::{EncProvider, HashProvider};
use crate::providers::{
    fix_key, Aes128Cts, Aes256Cts, ArcfourStream, Camellia128Cts, Camellia256Cts, Des3Cbc,
    DesCbc, Md4Hash, Md5Hash, Sha1Hash, Sha256Hash, Sha384Hash,
};
use crate::str2key;

pub const ENCTYPE_DES_CBC_CRC: i32 = 1;
pub const ENCTYPE_DES_CBC_MD4: i32 = 2;
pub const ENCTYPE_DES_CBC_MD5: i32 = 3;
pub const ENCTYPE_DES_CBC_RAW: i32 = 4;
pub const ENCTYPE_DES3_CBC_RAW: i32 = 6;
pub const ENCTYPE_DES3_CBC_SHA1: i32 = 16;
pub const ENCTYPE_AES128_CTS_HMAC_SHA1_96: i32 = 17;
pub const ENCTYPE_AES256_CTS_HMAC_SHA1_96: i32 = 18;
pub const ENCTYPE_AES128_CTS_HMAC_SHA256_128: i32 = 19;
pub const ENCTYPE_AES256_CTS_HMAC_SHA384_192: i32 = 20;
pub const ENCTYPE_ARCFOUR_HMAC: i32 = 23;
pub const ENCTYPE_ARCFOUR_HMAC_EXP: i32 = 24;
pub const ENCTYPE_CAMELLIA128_CTS_CMAC: i32 = 25;
pub const ENCTYPE_CAMELLIA256_CTS_CMAC: i32 = 26;

/// Single-DES strength or export-grade RC4; refuse outside test realms.
pub const ETYPE_WEAK: u32 = 1 << 0;
/// Interoperable but no longer acceptable for new deployments.
pub const ETYPE_DEPRECATED: u32 = 1 << 1;

pub(crate) type CryptFn = fn(
    &EnctypeProfile,
    &Key,
    u32,
    Option<&mut [u8]>,
    &mut [crate::iov::CryptoIov<'_>],
) -> Result<()>;

pub(crate) type LengthFn = fn(&EnctypeProfile, IovKind) -> Result<usize>;

pub(crate) type Str2KeyFn =
    fn(&EnctypeProfile, &str, &[u8], Option<&[u8]>) -> Result<Keyblock>;

pub(crate) type Rand2KeyFn = fn(&EnctypeProfile, &[u8]) -> Result<Keyblock>;

pub(crate) type PrfFn = fn(&EnctypeProfile, &Key, &[u8], &mut [u8]) -> Result<()>;

/// One registry row. The public fields describe the enctype; the function
/// pointers select the composite scheme shared by its family.
pub struct EnctypeProfile {
    pub etype: i32,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub enc: &'static dyn EncProvider,
    pub hash: Option<&'static dyn HashProvider>,
    /// HMAC/CMAC truncation length, or the embedded checksum length for the
    /// legacy confounder schemes.
    pub(crate) tag_len: usize,
    pub(crate) derive_alg: DeriveAlg,
    pub prf_length: usize,
    /// Checksum type resolved when a caller asks for type 0.
    pub mandatory_cksumtype: i32,
    pub flags: u32,
    /// Nominal work factor in bits, for preference ordering.
    pub strength_bits: u16,
    /// des-cbc-crc initializes the cipher state from the key itself.
    pub(crate) iv_from_key: bool,
    pub(crate) lengths: LengthFn,
    pub(crate) encrypt: CryptFn,
    pub(crate) decrypt: CryptFn,
    pub(crate) str2key: Str2KeyFn,
    pub(crate) rand2key: Rand2KeyFn,
    pub(crate) prf: Option<PrfFn>,
}

impl EnctypeProfile {
    pub(crate) fn crypto_length(&self, kind: IovKind) -> Result<usize> {
        (self.lengths)(self, kind)
    }
}

fn len_dk_cbc(p: &EnctypeProfile, kind: IovKind) -> Result<usize> {
    match kind {
        IovKind::Header => Ok(p.enc.block_size()),
        IovKind::Padding => Ok(p.enc.block_size()),
        IovKind::Trailer | IovKind::Checksum => Ok(p.tag_len),
        _ => Err(Error::InvalidParameter("buffer kind has no fixed length")),
    }
}

fn len_cts(p: &EnctypeProfile, kind: IovKind) -> Result<usize> {
    match kind {
        IovKind::Header => Ok(p.enc.block_size()),
        IovKind::Padding => Ok(0),
        IovKind::Trailer | IovKind::Checksum => Ok(p.tag_len),
        _ => Err(Error::InvalidParameter("buffer kind has no fixed length")),
    }
}

fn len_old(p: &EnctypeProfile, kind: IovKind) -> Result<usize> {
    match kind {
        // Confounder followed by the embedded plaintext checksum.
        IovKind::Header => Ok(p.enc.block_size() + p.tag_len),
        IovKind::Padding => Ok(p.enc.block_size()),
        IovKind::Trailer => Ok(0),
        IovKind::Checksum => Ok(p.tag_len),
        _ => Err(Error::InvalidParameter("buffer kind has no fixed length")),
    }
}

fn len_raw(p: &EnctypeProfile, kind: IovKind) -> Result<usize> {
    match kind {
        IovKind::Header | IovKind::Trailer | IovKind::Checksum => Ok(0),
        IovKind::Padding => Ok(p.enc.block_size()),
        _ => Err(Error::InvalidParameter("buffer kind has no fixed length")),
    }
}

fn len_arcfour(_p: &EnctypeProfile, kind: IovKind) -> Result<usize> {
    match kind {
        // HMAC-MD5 checksum, then the 8-byte confounder.
        IovKind::Header => Ok(16 + 8),
        IovKind::Padding | IovKind::Trailer => Ok(0),
        IovKind::Checksum => Ok(16),
        _ => Err(Error::InvalidParameter("buffer kind has no fixed length")),
    }
}

/// Seed bytes become the key verbatim (AES, Camellia, RC4 families).
pub(crate) fn rand2key_direct(p: &EnctypeProfile, seed: &[u8]) -> Result<Keyblock> {
    if seed.len() != p.enc.keybytes() {
        return Err(Error::BadKeySize);
    }
    Keyblock::new(p.etype, seed.to_vec())
}

/// Expand 7 seed bytes to an 8-byte DES key: the eighth byte collects the
/// low bit of each seed byte, then parity and weak-key fixup apply.
fn expand_des_seed(seed: &[u8]) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..7].copy_from_slice(seed);
    let mut last = 0u8;
    for (i, &b) in seed.iter().enumerate() {
        last |= (b & 1) << (i + 1);
    }
    key[7] = last;
    fix_key(&mut key);
    key
}

pub(crate) fn rand2key_des(p: &EnctypeProfile, seed: &[u8]) -> Result<Keyblock> {
    if seed.len() != 7 {
        return Err(Error::BadKeySize);
    }
    Keyblock::new(p.etype, expand_des_seed(seed).to_vec())
}

pub(crate) fn rand2key_des3(p: &EnctypeProfile, seed: &[u8]) -> Result<Keyblock> {
    if seed.len() != 21 {
        return Err(Error::BadKeySize);
    }
    let mut key = Vec::with_capacity(24);
    for part in seed.chunks_exact(7) {
        key.extend_from_slice(&expand_des_seed(part));
    }
    Keyblock::new(p.etype, key)
}

static ENCTYPES: [EnctypeProfile; 14] = [
    EnctypeProfile {
        etype: ENCTYPE_DES_CBC_CRC,
        name: "des-cbc-crc",
        aliases: &["des"],
        enc: &DesCbc,
        hash: None,
        tag_len: 4,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_RSA_MD5_DES,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 56,
        iv_from_key: true,
        lengths: len_old,
        encrypt: enc::old::encrypt_crc32,
        decrypt: enc::old::decrypt_crc32,
        str2key: str2key::des,
        rand2key: rand2key_des,
        prf: Some(prf::des_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_DES_CBC_MD4,
        name: "des-cbc-md4",
        aliases: &[],
        enc: &DesCbc,
        hash: Some(&Md4Hash),
        tag_len: 16,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_RSA_MD4_DES,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 56,
        iv_from_key: false,
        lengths: len_old,
        encrypt: enc::old::encrypt_hash,
        decrypt: enc::old::decrypt_hash,
        str2key: str2key::des,
        rand2key: rand2key_des,
        prf: Some(prf::des_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_DES_CBC_MD5,
        name: "des-cbc-md5",
        aliases: &[],
        enc: &DesCbc,
        hash: Some(&Md5Hash),
        tag_len: 16,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_RSA_MD5_DES,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 56,
        iv_from_key: false,
        lengths: len_old,
        encrypt: enc::old::encrypt_hash,
        decrypt: enc::old::decrypt_hash,
        str2key: str2key::des,
        rand2key: rand2key_des,
        prf: Some(prf::des_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_DES_CBC_RAW,
        name: "des-cbc-raw",
        aliases: &[],
        enc: &DesCbc,
        hash: None,
        tag_len: 0,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 0,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_RSA_MD5_DES,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 56,
        iv_from_key: false,
        lengths: len_raw,
        encrypt: enc::raw::encrypt,
        decrypt: enc::raw::decrypt,
        str2key: str2key::des,
        rand2key: rand2key_des,
        prf: None,
    },
    EnctypeProfile {
        etype: ENCTYPE_DES3_CBC_RAW,
        name: "des3-cbc-raw",
        aliases: &[],
        enc: &Des3Cbc,
        hash: None,
        tag_len: 0,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 0,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA1_DES3,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 112,
        iv_from_key: false,
        lengths: len_raw,
        encrypt: enc::raw::encrypt,
        decrypt: enc::raw::decrypt,
        str2key: str2key::des3,
        rand2key: rand2key_des3,
        prf: None,
    },
    EnctypeProfile {
        etype: ENCTYPE_DES3_CBC_SHA1,
        name: "des3-cbc-sha1",
        aliases: &["des3-hmac-sha1", "des3-cbc-sha1-kd"],
        enc: &Des3Cbc,
        hash: Some(&Sha1Hash),
        tag_len: 20,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA1_DES3,
        flags: ETYPE_DEPRECATED,
        strength_bits: 112,
        iv_from_key: false,
        lengths: len_dk_cbc,
        encrypt: enc::dk_hmac::encrypt,
        decrypt: enc::dk_hmac::decrypt,
        str2key: str2key::des3,
        rand2key: rand2key_des3,
        prf: Some(prf::dk_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_AES128_CTS_HMAC_SHA1_96,
        name: "aes128-cts-hmac-sha1-96",
        aliases: &["aes128-cts", "aes128-sha1"],
        enc: &Aes128Cts,
        hash: Some(&Sha1Hash),
        tag_len: 12,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA1_96_AES128,
        flags: 0,
        strength_bits: 128,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::dk_hmac::encrypt,
        decrypt: enc::dk_hmac::decrypt,
        str2key: str2key::aes_sha1,
        rand2key: rand2key_direct,
        prf: Some(prf::dk_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_AES256_CTS_HMAC_SHA1_96,
        name: "aes256-cts-hmac-sha1-96",
        aliases: &["aes256-cts", "aes256-sha1"],
        enc: &Aes256Cts,
        hash: Some(&Sha1Hash),
        tag_len: 12,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA1_96_AES256,
        flags: 0,
        strength_bits: 256,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::dk_hmac::encrypt,
        decrypt: enc::dk_hmac::decrypt,
        str2key: str2key::aes_sha1,
        rand2key: rand2key_direct,
        prf: Some(prf::dk_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_AES128_CTS_HMAC_SHA256_128,
        name: "aes128-cts-hmac-sha256-128",
        aliases: &["aes128-sha2"],
        enc: &Aes128Cts,
        hash: Some(&Sha256Hash),
        tag_len: 16,
        derive_alg: DeriveAlg::Sp800_108CounterHmac,
        prf_length: 32,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA256_128_AES128,
        flags: 0,
        strength_bits: 128,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::etm::encrypt,
        decrypt: enc::etm::decrypt,
        str2key: str2key::aes_sha2,
        rand2key: rand2key_direct,
        prf: Some(prf::sha2_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_AES256_CTS_HMAC_SHA384_192,
        name: "aes256-cts-hmac-sha384-192",
        aliases: &["aes256-sha2"],
        enc: &Aes256Cts,
        hash: Some(&Sha384Hash),
        tag_len: 24,
        derive_alg: DeriveAlg::Sp800_108CounterHmac,
        prf_length: 48,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_SHA384_192_AES256,
        flags: 0,
        strength_bits: 192,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::etm::encrypt,
        decrypt: enc::etm::decrypt,
        str2key: str2key::aes_sha2,
        rand2key: rand2key_direct,
        prf: Some(prf::sha2_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_ARCFOUR_HMAC,
        name: "arcfour-hmac",
        aliases: &["rc4-hmac", "arcfour-hmac-md5"],
        enc: &ArcfourStream,
        hash: Some(&Md5Hash),
        tag_len: 16,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 20,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_MD5_ARCFOUR,
        flags: ETYPE_DEPRECATED,
        strength_bits: 80,
        iv_from_key: false,
        lengths: len_arcfour,
        encrypt: enc::arcfour::encrypt,
        decrypt: enc::arcfour::decrypt,
        str2key: str2key::arcfour,
        rand2key: rand2key_direct,
        prf: Some(prf::arcfour_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_ARCFOUR_HMAC_EXP,
        name: "arcfour-hmac-exp",
        aliases: &["rc4-hmac-exp", "arcfour-hmac-md5-exp"],
        enc: &ArcfourStream,
        hash: Some(&Md5Hash),
        tag_len: 16,
        derive_alg: DeriveAlg::Rfc3961,
        prf_length: 20,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_HMAC_MD5_ARCFOUR,
        flags: ETYPE_WEAK | ETYPE_DEPRECATED,
        strength_bits: 40,
        iv_from_key: false,
        lengths: len_arcfour,
        encrypt: enc::arcfour::encrypt,
        decrypt: enc::arcfour::decrypt,
        str2key: str2key::arcfour,
        rand2key: rand2key_direct,
        prf: Some(prf::arcfour_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_CAMELLIA128_CTS_CMAC,
        name: "camellia128-cts-cmac",
        aliases: &["camellia128-cts"],
        enc: &Camellia128Cts,
        hash: None,
        tag_len: 16,
        derive_alg: DeriveAlg::Sp800_108FeedbackCmac,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_CMAC_CAMELLIA128,
        flags: 0,
        strength_bits: 128,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::dk_cmac::encrypt,
        decrypt: enc::dk_cmac::decrypt,
        str2key: str2key::camellia,
        rand2key: rand2key_direct,
        prf: Some(prf::cmac_prf),
    },
    EnctypeProfile {
        etype: ENCTYPE_CAMELLIA256_CTS_CMAC,
        name: "camellia256-cts-cmac",
        aliases: &["camellia256-cts"],
        enc: &Camellia256Cts,
        hash: None,
        tag_len: 16,
        derive_alg: DeriveAlg::Sp800_108FeedbackCmac,
        prf_length: 16,
        mandatory_cksumtype: crate::cksumtype::CKSUMTYPE_CMAC_CAMELLIA256,
        flags: 0,
        strength_bits: 256,
        iv_from_key: false,
        lengths: len_cts,
        encrypt: enc::dk_cmac::encrypt,
        decrypt: enc::dk_cmac::decrypt,
        str2key: str2key::camellia,
        rand2key: rand2key_direct,
        prf: Some(prf::cmac_prf),
    },
];

/// Look up a profile by enctype number.
pub fn find_enctype(etype: i32) -> Result<&'static EnctypeProfile> {
    ENCTYPES
        .iter()
        .find(|p| p.etype == etype)
        .ok_or(Error::BadEnctype(etype))
}

/// Look up a profile by canonical name or alias, case-insensitively.
pub fn find_enctype_by_name(name: &str) -> Result<&'static EnctypeProfile> {
    ENCTYPES
        .iter()
        .find(|p| {
            p.name.eq_ignore_ascii_case(name)
                || p.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
        .ok_or(Error::BadEnctype(0))
}

/// All registered enctype numbers, registry order.
pub fn enctype_list() -> impl Iterator<Item = &'static EnctypeProfile> {
    ENCTYPES.iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_number_and_name_agree() {
        for p in enctype_list() {
            assert_eq!(find_enctype(p.etype).unwrap().etype, p.etype);
            assert_eq!(find_enctype_by_name(p.name).unwrap().etype, p.etype);
            for alias in p.aliases {
                assert_eq!(find_enctype_by_name(alias).unwrap().etype, p.etype);
            }
        }
    }

    #[test]
    fn name_lookup_ignores_case() {
        assert_eq!(
            find_enctype_by_name("AES256-CTS-HMAC-SHA1-96").unwrap().etype,
            ENCTYPE_AES256_CTS_HMAC_SHA1_96
        );
        assert_eq!(
            find_enctype_by_name("RC4-hmac").unwrap().etype,
            ENCTYPE_ARCFOUR_HMAC
        );
    }

    #[test]
    fn unknown_enctype_is_reported_with_its_number() {
        assert!(matches!(find_enctype(99), Err(Error::BadEnctype(99))));
        assert!(find_enctype_by_name("vigenere").is_err());
    }

    #[test]
    fn key_and_seed_lengths_are_consistent() {
        for p in enctype_list() {
            assert!(p.enc.keybytes() <= p.enc.keylength());
            let seed = vec![0x2au8; p.enc.keybytes()];
            let kb = (p.rand2key)(p, &seed).unwrap();
            assert_eq!(kb.len(), p.enc.keylength());
        }
    }

    #[test]
    fn des_seed_expansion_sets_parity_and_low_bits() {
        let p = find_enctype(ENCTYPE_DES_CBC_MD5).unwrap();
        let kb = (p.rand2key)(p, &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]).unwrap();
        for b in kb.contents() {
            assert_eq!(b.count_ones() % 2, 1, "odd parity on every byte");
        }
        assert!((p.rand2key)(p, &[0u8; 8]).is_err(), "seed must be 7 bytes");
    }

    #[test]
    fn weak_and_deprecated_flags() {
        assert!(find_enctype(ENCTYPE_DES_CBC_CRC).unwrap().flags & ETYPE_WEAK != 0);
        assert!(find_enctype(ENCTYPE_ARCFOUR_HMAC_EXP).unwrap().flags & ETYPE_WEAK != 0);
        let rc4 = find_enctype(ENCTYPE_ARCFOUR_HMAC).unwrap();
        assert!(rc4.flags & ETYPE_WEAK == 0);
        assert!(rc4.flags & ETYPE_DEPRECATED != 0);
        assert_eq!(find_enctype(ENCTYPE_AES256_CTS_HMAC_SHA1_96).unwrap().flags, 0);
    }
}
