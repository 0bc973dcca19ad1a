//! krbkit-crypto: Kerberos encryption framework
//!
//! Architecture: one registry row per RFC enctype, composite schemes built
//! from swappable cipher/hash backends
//!
//! Pipeline: password → string-to-key → protocol key → derive (usage, seed) → encrypt/checksum
//!
//! Key hierarchy:
//! ```text
//! Protocol Key (string-to-key or random-to-key)
//!   ├── Ke (BE32(usage) || 0xAA) encryption sub-key
//!   ├── Ki (BE32(usage) || 0x55) integrity sub-key
//!   ├── Kc (BE32(usage) || 0x99) checksum sub-key
//!   └── derivation engine per family:
//!       RFC 3961 (n-fold + CBC chain) | SP800-108 feedback CMAC | SP800-108 counter HMAC
//! ```
//!
//! Supported families: single DES (1-4), triple DES (6, 16), AES with SHA-1
//! (17, 18), AES with SHA-2 (19, 20), arcfour (23, 24), Camellia (25, 26).

mod checksum;
mod cksumtype;
pub mod cmac;
mod crc32;
mod dispatch;
mod enc;
mod enctype;
mod error;
pub mod hmac;
mod iov;
mod kdf;
mod key;
mod nfold;
mod prf;
mod provider;
mod providers;
mod str2key;

pub use checksum::{
    checksum_iov, checksum_length, make_checksum, verify_checksum, verify_checksum_iov,
};
pub use cksumtype::{
    cksumtype_list, find_cksumtype, find_cksumtype_by_name, ChecksumProfile, CKSUMTYPE_CMAC_CAMELLIA128,
    CKSUMTYPE_CMAC_CAMELLIA256, CKSUMTYPE_CRC32, CKSUMTYPE_HMAC_MD5_ARCFOUR,
    CKSUMTYPE_HMAC_SHA1_96_AES128, CKSUMTYPE_HMAC_SHA1_96_AES256, CKSUMTYPE_HMAC_SHA1_DES3,
    CKSUMTYPE_HMAC_SHA256_128_AES128, CKSUMTYPE_HMAC_SHA384_192_AES256, CKSUMTYPE_RSA_MD4,
    CKSUMTYPE_RSA_MD4_DES, CKSUMTYPE_RSA_MD5, CKSUMTYPE_RSA_MD5_DES, CKSUMTYPE_SHA1,
    CKSUM_NOT_COLLISION_PROOF, CKSUM_UNKEYED,
};
pub use dispatch::{
    cksumtype_name, crypto_length, decrypt, decrypt_iov, encrypt, encrypt_iov, encrypt_length,
    enctype_name, init_state, is_deprecated, is_weak, make_random_key, prf, prf_length,
    random_to_key, required_lengths, string_to_cksumtype, string_to_enctype, string_to_key,
    string_to_key_with_params,
};
pub use enctype::{
    enctype_list, find_enctype, find_enctype_by_name, EnctypeProfile,
    ENCTYPE_AES128_CTS_HMAC_SHA1_96, ENCTYPE_AES128_CTS_HMAC_SHA256_128,
    ENCTYPE_AES256_CTS_HMAC_SHA1_96, ENCTYPE_AES256_CTS_HMAC_SHA384_192, ENCTYPE_ARCFOUR_HMAC,
    ENCTYPE_ARCFOUR_HMAC_EXP, ENCTYPE_CAMELLIA128_CTS_CMAC, ENCTYPE_CAMELLIA256_CTS_CMAC,
    ENCTYPE_DES3_CBC_RAW, ENCTYPE_DES3_CBC_SHA1, ENCTYPE_DES_CBC_CRC, ENCTYPE_DES_CBC_MD4,
    ENCTYPE_DES_CBC_MD5, ENCTYPE_DES_CBC_RAW, ETYPE_DEPRECATED, ETYPE_WEAK,
};
pub use error::{Error, Result};
pub use iov::{CryptoIov, IovKind};
pub use kdf::{derive_key, derive_keyblock, derive_random, DeriveAlg};
pub use key::{Key, Keyblock};
pub use nfold::nfold;
pub use provider::{EncProvider, HashProvider};
