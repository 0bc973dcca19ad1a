//! Key derivation.
//!
//! Three interchangeable engines produce pseudo-random bytes from an input
//! key and a derivation constant: the RFC 3961 n-fold-and-encrypt
//! construction (DES3, AES-SHA1), SP800-108 feedback mode over CMAC
//! (Camellia, RFC 6803), and SP800-108 counter mode over HMAC (AES-SHA2,
//! RFC 8009). `derive_keyblock` post-processes engine output through the
//! enctype's random-to-key; `derive_key` adds the per-key cache.

use zeroize::Zeroizing;

use crate::cmac::cmac;
use crate::enctype::{find_enctype, EnctypeProfile};
use crate::error::{Error, Result};
use crate::hmac::hmac;
use crate::key::{Key, Keyblock};
use crate::provider::HashProvider;

/// Which derivation construction an enctype family uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeriveAlg {
    Rfc3961,
    Sp800_108FeedbackCmac,
    Sp800_108CounterHmac,
}

/// The RFC 3961 usage constants: key-usage number plus a role seed byte.
pub(crate) fn usage_constant(usage: u32, seed: u8) -> [u8; 5] {
    let be = usage.to_be_bytes();
    [be[0], be[1], be[2], be[3], seed]
}

pub(crate) const SEED_CHECKSUM: u8 = 0x99;
pub(crate) const SEED_ENCRYPTION: u8 = 0xaa;
pub(crate) const SEED_INTEGRITY: u8 = 0x55;

/// RFC 3961 DR(): n-fold the constant to a block, then chain single-block
/// encryptions until enough output accumulates.
fn derive_random_rfc3961(
    profile: &EnctypeProfile,
    key: &Keyblock,
    constant: &[u8],
    outlen: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let enc = profile.enc;
    let bs = enc.block_size();
    if bs == 1 {
        return Err(Error::InvalidParameter(
            "RFC 3961 derivation is undefined for stream ciphers",
        ));
    }
    let mut block = Zeroizing::new(if constant.len() == bs {
        constant.to_vec()
    } else {
        crate::nfold::nfold(constant, bs)
    });
    let mut out = Zeroizing::new(Vec::with_capacity(outlen + bs));
    while out.len() < outlen {
        let mut next = Zeroizing::new(vec![0u8; bs]);
        enc.cbc_mac(key, &[&block[..]], None, &mut next)?;
        out.extend_from_slice(&next);
        block.copy_from_slice(&next);
    }
    out.truncate(outlen);
    Ok(out)
}

/// SP800-108 feedback mode with CMAC as the PRF (RFC 6803).
fn derive_random_feedback_cmac(
    profile: &EnctypeProfile,
    key: &Keyblock,
    label: &[u8],
    outlen: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let enc = profile.enc;
    let bs = enc.block_size();
    let outbits = ((outlen * 8) as u32).to_be_bytes();
    let mut prev = Zeroizing::new(vec![0u8; bs]);
    let mut out = Zeroizing::new(Vec::with_capacity(outlen + bs));
    let mut counter = 1u32;
    while out.len() < outlen {
        let i = counter.to_be_bytes();
        let block = cmac(enc, key, &[&prev[..], &i, label, &[0x00], &outbits])?;
        out.extend_from_slice(&block);
        prev.copy_from_slice(&block);
        counter += 1;
    }
    out.truncate(outlen);
    Ok(out)
}

/// SP800-108 counter mode with HMAC as the PRF (RFC 8009). One PRF call
/// only: requests beyond the digest size are refused rather than iterated.
pub(crate) fn sp800_108_counter_hmac(
    hash: &dyn HashProvider,
    key: &[u8],
    label: &[u8],
    context: &[u8],
    outlen: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if outlen > hash.hash_size() {
        return Err(Error::InvalidParameter(
            "counter-HMAC output cannot exceed one digest",
        ));
    }
    let outbits = ((outlen * 8) as u32).to_be_bytes();
    let one = 1u32.to_be_bytes();
    let mut full = Zeroizing::new(hmac(hash, key, &[&one, label, &[0x00], context, &outbits])?);
    full.truncate(outlen);
    Ok(full)
}

/// Produce `outlen` pseudo-random octets from `key` and `constant` with the
/// selected engine.
pub fn derive_random(
    key: &Keyblock,
    constant: &[u8],
    alg: DeriveAlg,
    outlen: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let profile = find_enctype(key.enctype())?;
    match alg {
        DeriveAlg::Rfc3961 => derive_random_rfc3961(profile, key, constant, outlen),
        DeriveAlg::Sp800_108FeedbackCmac => {
            derive_random_feedback_cmac(profile, key, constant, outlen)
        }
        DeriveAlg::Sp800_108CounterHmac => {
            let hash = profile
                .hash
                .ok_or(Error::InvalidParameter("enctype has no hash for HMAC KDF"))?;
            sp800_108_counter_hmac(hash, key.contents(), constant, &[], outlen)
        }
    }
}

/// Derive a finished sub-key: run the KDF for `keybytes` octets, then apply
/// the enctype's random-to-key fixup (parity for DES, identity elsewhere).
pub fn derive_keyblock(key: &Keyblock, constant: &[u8], alg: DeriveAlg) -> Result<Keyblock> {
    let profile = find_enctype(key.enctype())?;
    let seed = derive_random(key, constant, alg, profile.enc.keybytes())?;
    (profile.rand2key)(profile, &seed)
}

/// Cached derivation: repeated calls with the same constant return a new
/// handle to the same sub-key without rerunning the KDF.
pub fn derive_key(key: &Key, constant: &[u8], alg: DeriveAlg) -> Result<Key> {
    key.cached_or_derive(constant, || derive_keyblock(key.keyblock(), constant, alg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enctype::{
        ENCTYPE_AES128_CTS_HMAC_SHA1_96, ENCTYPE_AES128_CTS_HMAC_SHA256_128,
        ENCTYPE_AES256_CTS_HMAC_SHA384_192, ENCTYPE_DES3_CBC_SHA1,
    };

    fn kb(etype: i32, hex_key: &str) -> Keyblock {
        Keyblock::new(etype, hex::decode(hex_key).unwrap()).unwrap()
    }

    #[test]
    fn aes128_kc_vector() {
        // RFC 3962 derivation of Kc for key usage 2.
        let base = kb(
            ENCTYPE_AES128_CTS_HMAC_SHA1_96,
            "42263c6e89f4fc28b8df68ee09799f15",
        );
        let kc = derive_keyblock(&base, &usage_constant(2, SEED_CHECKSUM), DeriveAlg::Rfc3961)
            .unwrap();
        assert_eq!(
            hex::encode(kc.contents()),
            "34280a382bc92769b2da2f9ef066854b"
        );
    }

    #[test]
    fn des3_derived_key_vector() {
        // RFC 3961 appendix A.4, key usage 1, integrity seed.
        let base = kb(
            ENCTYPE_DES3_CBC_SHA1,
            "dce06b1f64c857a11c3db57c51899b2cc1791008ce973b92",
        );
        let dk = derive_keyblock(
            &base,
            &usage_constant(1, SEED_INTEGRITY),
            DeriveAlg::Rfc3961,
        )
        .unwrap();
        assert_eq!(
            hex::encode(dk.contents()),
            "925179d04591a79b5d3192c4a7e9c289b049c71f6ee604cd"
        );
    }

    #[test]
    fn rfc8009_aes128_sha256_kdf_vectors() {
        let base = kb(
            ENCTYPE_AES128_CTS_HMAC_SHA256_128,
            "3705d96080c17728a0e800eab6e0d23c",
        );
        let alg = DeriveAlg::Sp800_108CounterHmac;
        let kc = derive_keyblock(&base, &usage_constant(2, SEED_CHECKSUM), alg).unwrap();
        assert_eq!(
            hex::encode(kc.contents()),
            "b31a018a48f54776f403e9a396325dc3"
        );
        let ke = derive_keyblock(&base, &usage_constant(2, SEED_ENCRYPTION), alg).unwrap();
        assert_eq!(
            hex::encode(ke.contents()),
            "9b197dd1e8c5609d6e67c3e37c62c72e"
        );
        let ki = derive_keyblock(&base, &usage_constant(2, SEED_INTEGRITY), alg).unwrap();
        assert_eq!(
            hex::encode(ki.contents()),
            "9fda0e56ab2d85e1569a688696c26a6c"
        );
    }

    #[test]
    fn rfc8009_aes256_sha384_kdf_vectors() {
        let base = kb(
            ENCTYPE_AES256_CTS_HMAC_SHA384_192,
            "6d404d37faf79f9df0d33568d320669800eb4836472ea8a026d16b7182460c52",
        );
        let alg = DeriveAlg::Sp800_108CounterHmac;
        // Kc and Ki are 192 bits for this enctype, shorter than the key.
        let kc = derive_random(&base, &usage_constant(2, SEED_CHECKSUM), alg, 24).unwrap();
        assert_eq!(
            hex::encode(&kc[..]),
            "ef5718be86cc84963d8bbb5031e9f5c4ba41f28faf69e73d"
        );
        let ke = derive_random(&base, &usage_constant(2, SEED_ENCRYPTION), alg, 32).unwrap();
        assert_eq!(
            hex::encode(&ke[..]),
            "56ab22bee63d82d7bc5227f6773f8ea7a5eb1c825160c38312980c442e5c7e49"
        );
        let ki = derive_random(&base, &usage_constant(2, SEED_INTEGRITY), alg, 24).unwrap();
        assert_eq!(
            hex::encode(&ki[..]),
            "69b16514e3cd8e56b82010d5c73012b622c4d00ffc23ed1f"
        );
    }

    #[test]
    fn counter_hmac_refuses_multi_digest_output() {
        let base = kb(
            ENCTYPE_AES128_CTS_HMAC_SHA256_128,
            "3705d96080c17728a0e800eab6e0d23c",
        );
        assert!(derive_random(&base, b"label", DeriveAlg::Sp800_108CounterHmac, 33).is_err());
    }

    #[test]
    fn derivation_is_deterministic_and_cached() {
        let base = Key::new(kb(
            ENCTYPE_AES128_CTS_HMAC_SHA1_96,
            "42263c6e89f4fc28b8df68ee09799f15",
        ));
        let constant = usage_constant(5, SEED_ENCRYPTION);
        let a = derive_key(&base, &constant, DeriveAlg::Rfc3961).unwrap();
        let b = derive_key(&base, &constant, DeriveAlg::Rfc3961).unwrap();
        assert_eq!(a.contents(), b.contents());
        assert!(a.same_key(&b), "second call must be a cache hit");
        assert_eq!(base.cache_len(), 1, "cache must not grow on repeats");

        let c = derive_key(&base, &usage_constant(5, SEED_INTEGRITY), DeriveAlg::Rfc3961).unwrap();
        assert!(!a.same_key(&c));
        assert_eq!(base.cache_len(), 2);
    }

    #[test]
    fn stream_cipher_rejects_rfc3961_kdf() {
        let base = kb(crate::enctype::ENCTYPE_ARCFOUR_HMAC, "00112233445566778899aabbccddeeff");
        assert!(derive_random(&base, b"c", DeriveAlg::Rfc3961, 16).is_err());
    }
}
