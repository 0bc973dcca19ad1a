//! Password-to-key algorithms, one per enctype family.
//!
//! The salt is the caller's concatenated realm and principal components (or
//! whatever the KDC handed out). Parameter strings are the 4-byte big-endian
//! PBKDF2 iteration count where the family takes one; the single-byte AFS3
//! marker is recognized and refused.

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha384};
use zeroize::Zeroizing;

use crate::enctype::{rand2key_des3, EnctypeProfile};
use crate::error::{Error, Result};
use crate::kdf::{derive_keyblock, DeriveAlg};
use crate::key::Keyblock;
use crate::nfold::nfold;
use crate::providers::{fix_key, DesCbc, Md4Hash};
use crate::provider::{EncProvider, HashProvider};

fn iteration_count(params: Option<&[u8]>, default: u32) -> Result<u32> {
    match params {
        None => Ok(default),
        Some([]) => Ok(default),
        Some([0x01]) => Err(Error::InvalidParameter(
            "AFS3 string-to-key is not supported",
        )),
        Some(p) if p.len() == 4 => {
            let n = u32::from_be_bytes([p[0], p[1], p[2], p[3]]);
            if n == 0 {
                Err(Error::InvalidParameter("iteration count cannot be zero"))
            } else {
                Ok(n)
            }
        }
        Some(_) => Err(Error::InvalidParameter(
            "malformed string-to-key parameters",
        )),
    }
}

fn no_params(params: Option<&[u8]>) -> Result<()> {
    match params {
        None | Some([]) => Ok(()),
        Some([0x01]) => Err(Error::InvalidParameter(
            "AFS3 string-to-key is not supported",
        )),
        Some(_) => Err(Error::InvalidParameter(
            "enctype takes no string-to-key parameters",
        )),
    }
}

/// Nibble-wise bit reversal table for the reverse fan-fold passes.
const SWAP: [u8; 16] = [
    0x0, 0x8, 0x4, 0xc, 0x2, 0xa, 0x6, 0xe, 0x1, 0x9, 0x5, 0xd, 0x3, 0xb, 0x7, 0xf,
];

/// The original DES algorithm: fan-fold the 7-bit characters across the key
/// alternating direction, fix parity, then replace the key with the DES
/// CBC-MAC of the input under itself.
pub(crate) fn des(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    no_params(params)?;
    let mut s = Zeroizing::new(Vec::with_capacity(password.len() + salt.len() + 7));
    s.extend_from_slice(password.as_bytes());
    s.extend_from_slice(salt);
    let padded_len = s.len().div_ceil(8) * 8;
    s.resize(padded_len, 0);

    let mut key = Zeroizing::new([0u8; 8]);
    let mut pos = 0usize;
    let mut reverse = false;
    for &c in s.iter() {
        let tmp = c & 0x7f;
        if !reverse {
            key[pos] ^= tmp << 1;
            pos += 1;
        } else {
            pos -= 1;
            key[pos] ^= (SWAP[(tmp & 0xf) as usize] << 4) | SWAP[((tmp >> 4) & 0xf) as usize];
        }
        if pos == 8 {
            reverse = true;
        }
        if pos == 0 {
            reverse = false;
        }
    }
    fix_key(&mut key[..]);

    let folded = Keyblock::raw(profile.etype, key.to_vec());
    let mut mac = Zeroizing::new([0u8; 8]);
    DesCbc.cbc_mac(&folded, &[&s[..]], Some(folded.contents()), &mut mac[..])?;
    fix_key(&mut mac[..]);
    Keyblock::new(profile.etype, mac.to_vec())
}

/// RFC 3961 §6.3: n-fold the passphrase to a seed, then derive with the
/// constant "kerberos".
pub(crate) fn des3(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    no_params(params)?;
    let mut input = Zeroizing::new(Vec::with_capacity(password.len() + salt.len()));
    input.extend_from_slice(password.as_bytes());
    input.extend_from_slice(salt);
    let seed = Zeroizing::new(nfold(&input, 21));
    let tmp = rand2key_des3(profile, &seed)?;
    derive_keyblock(&tmp, b"kerberos", DeriveAlg::Rfc3961)
}

fn pbkdf2_then_derive(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    iterations: u32,
    alg: DeriveAlg,
) -> Result<Keyblock> {
    let mut seed = Zeroizing::new(vec![0u8; profile.enc.keylength()]);
    match alg {
        DeriveAlg::Sp800_108CounterHmac => {
            let hash = profile
                .hash
                .ok_or(Error::Internal("PBKDF2 enctype without a hash"))?;
            // RFC 8009 prepends the enctype name to the salt.
            let mut saltp = Vec::with_capacity(profile.name.len() + 1 + salt.len());
            saltp.extend_from_slice(profile.name.as_bytes());
            saltp.push(0);
            saltp.extend_from_slice(salt);
            match hash.name() {
                "sha256" => {
                    pbkdf2_hmac::<Sha256>(password.as_bytes(), &saltp, iterations, &mut seed)
                }
                "sha384" => {
                    pbkdf2_hmac::<Sha384>(password.as_bytes(), &saltp, iterations, &mut seed)
                }
                _ => return Err(Error::Internal("unexpected PBKDF2 hash")),
            }
        }
        _ => pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, iterations, &mut seed),
    }
    let tmp = Keyblock::raw(profile.etype, seed.to_vec());
    derive_keyblock(&tmp, b"kerberos", alg)
}

pub(crate) fn aes_sha1(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    let iterations = iteration_count(params, 4096)?;
    pbkdf2_then_derive(profile, password, salt, iterations, DeriveAlg::Rfc3961)
}

pub(crate) fn camellia(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    let iterations = iteration_count(params, 32768)?;
    pbkdf2_then_derive(
        profile,
        password,
        salt,
        iterations,
        DeriveAlg::Sp800_108FeedbackCmac,
    )
}

pub(crate) fn aes_sha2(
    profile: &EnctypeProfile,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    let iterations = iteration_count(params, 32768)?;
    pbkdf2_then_derive(
        profile,
        password,
        salt,
        iterations,
        DeriveAlg::Sp800_108CounterHmac,
    )
}

/// RFC 4757: the NT hash, MD4 over the UTF-16LE password. Salt ignored.
pub(crate) fn arcfour(
    profile: &EnctypeProfile,
    password: &str,
    _salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    no_params(params)?;
    let mut utf16 = Zeroizing::new(Vec::with_capacity(password.len() * 2));
    for unit in password.encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    let mut digest = vec![0u8; 16];
    Md4Hash.hash(&[&utf16[..]], &mut digest)?;
    Keyblock::new(profile.etype, digest)
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{string_to_key, string_to_key_with_params};
    use crate::enctype::{
        ENCTYPE_AES128_CTS_HMAC_SHA1_96, ENCTYPE_AES128_CTS_HMAC_SHA256_128,
        ENCTYPE_AES256_CTS_HMAC_SHA1_96, ENCTYPE_AES256_CTS_HMAC_SHA384_192,
        ENCTYPE_ARCFOUR_HMAC, ENCTYPE_DES3_CBC_SHA1, ENCTYPE_DES_CBC_MD5,
    };
    use crate::error::Error;

    fn s2k(etype: i32, password: &str, salt: &str) -> String {
        hex::encode(string_to_key(etype, password, salt.as_bytes()).unwrap().contents())
    }

    fn s2k_iter(etype: i32, password: &str, salt: &str, iter: u32) -> String {
        let params = iter.to_be_bytes();
        hex::encode(
            string_to_key_with_params(etype, password, salt.as_bytes(), Some(&params))
                .unwrap()
                .contents(),
        )
    }

    #[test]
    fn des_vectors() {
        // RFC 3961 appendix A.2.
        assert_eq!(
            s2k(ENCTYPE_DES_CBC_MD5, "password", "ATHENA.MIT.EDUraeburn"),
            "cbc22fae235298e3"
        );
        assert_eq!(
            s2k(ENCTYPE_DES_CBC_MD5, "potatoe", "WHITEHOUSE.GOVdanny"),
            "df3d32a74fd92a01"
        );
    }

    #[test]
    fn des3_vector() {
        // RFC 3961 appendix A.4.
        assert_eq!(
            s2k(ENCTYPE_DES3_CBC_SHA1, "password", "ATHENA.MIT.EDUraeburn"),
            "850bb51358548cd05e86768c313e3bfef7511937dcf72c3e"
        );
    }

    #[test]
    fn aes_sha1_vectors() {
        // RFC 3962 appendix B.
        assert_eq!(
            s2k_iter(ENCTYPE_AES128_CTS_HMAC_SHA1_96, "password", "ATHENA.MIT.EDUraeburn", 1),
            "42263c6e89f4fc28b8df68ee09799f15"
        );
        assert_eq!(
            s2k_iter(ENCTYPE_AES128_CTS_HMAC_SHA1_96, "password", "ATHENA.MIT.EDUraeburn", 2),
            "c651bf29e2300ac27fa469d693bdda13"
        );
        assert_eq!(
            s2k_iter(ENCTYPE_AES256_CTS_HMAC_SHA1_96, "password", "ATHENA.MIT.EDUraeburn", 1),
            "fe697b52bc0d3ce14432ba036a92e65bbb52280990a2fa27883998d72af30161"
        );
    }

    #[test]
    fn aes_sha2_vectors() {
        // RFC 8009 section "Sample password-to-key results".
        assert_eq!(
            s2k_iter(
                ENCTYPE_AES128_CTS_HMAC_SHA256_128,
                "password",
                "ATHENA.MIT.EDUraeburn",
                32768
            ),
            "089bca48b105ea6ea77ca5d2f39dc5e7"
        );
        assert_eq!(
            s2k_iter(
                ENCTYPE_AES256_CTS_HMAC_SHA384_192,
                "password",
                "ATHENA.MIT.EDUraeburn",
                32768
            ),
            "45bd806dbf6a833a9cffc1c94589a222367a79bc21c413718906e9f578a78467"
        );
    }

    #[test]
    fn arcfour_vector() {
        // RFC 4757 section 3: NT hash of "foo", salt irrelevant.
        assert_eq!(
            s2k(ENCTYPE_ARCFOUR_HMAC, "foo", ""),
            "ac8e657f83df82beea5d43bdaf7800cc"
        );
        assert_eq!(
            s2k(ENCTYPE_ARCFOUR_HMAC, "foo", "IGNORED.REALMfoo"),
            "ac8e657f83df82beea5d43bdaf7800cc"
        );
    }

    #[test]
    fn parameter_validation() {
        let afs = [0x01u8];
        assert!(matches!(
            string_to_key_with_params(ENCTYPE_DES_CBC_MD5, "x", b"y", Some(&afs)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            string_to_key_with_params(ENCTYPE_AES128_CTS_HMAC_SHA1_96, "x", b"y", Some(&afs)),
            Err(Error::InvalidParameter(_))
        ));
        let zero = 0u32.to_be_bytes();
        assert!(string_to_key_with_params(
            ENCTYPE_AES128_CTS_HMAC_SHA1_96,
            "x",
            b"y",
            Some(&zero)
        )
        .is_err());
        let odd = [1, 2, 3];
        assert!(string_to_key_with_params(
            ENCTYPE_AES128_CTS_HMAC_SHA1_96,
            "x",
            b"y",
            Some(&odd)
        )
        .is_err());
    }

    #[test]
    fn camellia_key_is_deterministic_with_correct_length() {
        use crate::enctype::{ENCTYPE_CAMELLIA128_CTS_CMAC, ENCTYPE_CAMELLIA256_CTS_CMAC};
        let a = string_to_key(ENCTYPE_CAMELLIA128_CTS_CMAC, "password", b"salt").unwrap();
        let b = string_to_key(ENCTYPE_CAMELLIA128_CTS_CMAC, "password", b"salt").unwrap();
        assert_eq!(a.contents(), b.contents());
        assert_eq!(a.len(), 16);
        let c = string_to_key(ENCTYPE_CAMELLIA256_CTS_CMAC, "password", b"salt").unwrap();
        assert_eq!(c.len(), 32);
        assert_ne!(&a.contents()[..], &c.contents()[..16]);
    }
}
