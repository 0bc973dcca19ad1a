//! RFC 4757 arcfour-hmac family. The header carries the HMAC-MD5 checksum
//! followed by the confounder; one RC4 keystream covers the confounder and
//! the payload. Key usage numbers pass through a Microsoft translation
//! table, and a usage-9 decryption that fails its integrity check is
//! retried as usage 8 on a saved copy of the ciphertext.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::fill_random;
use crate::enctype::{EnctypeProfile, ENCTYPE_ARCFOUR_HMAC_EXP};
use crate::error::{Error, Result};
use crate::hmac::hmac;
use crate::iov::{locate, validate_shape, CryptoIov, IovKind};
use crate::key::{Key, Keyblock};

const CKSUM_LEN: usize = 16;
const CONF_LEN: usize = 8;

/// Usage numbers this scheme inherited from the Microsoft SSPI world.
pub(crate) fn translate_usage(usage: u32) -> u32 {
    match usage {
        3 => 8,
        23 => 13,
        other => other,
    }
}

/// K1: the per-usage key, with the export-grade truncation applied for
/// arcfour-hmac-exp.
fn usage_key(profile: &EnctypeProfile, key: &Key, ms_usage: u32) -> Result<Zeroizing<Vec<u8>>> {
    let hash = profile
        .hash
        .ok_or(Error::Internal("arcfour enctype without a hash"))?;
    let exportable = profile.etype == ENCTYPE_ARCFOUR_HMAC_EXP;
    let mut salt = Vec::with_capacity(14);
    if exportable {
        salt.extend_from_slice(b"fortybits\x00");
    }
    salt.extend_from_slice(&ms_usage.to_le_bytes());
    let mut k1 = Zeroizing::new(hmac(hash, key.contents(), &[&salt])?);
    if exportable {
        k1[7..16].fill(0xab);
    }
    Ok(k1)
}

fn frame(profile: &EnctypeProfile, iovs: &[CryptoIov<'_>]) -> Result<usize> {
    validate_shape(iovs)?;
    let header = locate(iovs, IovKind::Header)?;
    if iovs[header].data.len() != profile.crypto_length(IovKind::Header)? {
        return Err(Error::BadMessageSize);
    }
    Ok(header)
}

/// Checksum input: the confounder, then every signed segment except the
/// header itself.
fn cksum_parts<'b, 'a>(iovs: &'b [CryptoIov<'a>], header: usize) -> Vec<&'b [u8]> {
    let mut parts: Vec<&[u8]> = vec![&iovs[header].data[CKSUM_LEN..]];
    for (i, iov) in iovs.iter().enumerate() {
        if i != header && iov.kind.is_signed() {
            parts.push(&*iov.data);
        }
    }
    parts
}

/// Apply the RC4 keystream to the confounder and the encrypted segments,
/// skipping the checksum bytes at the front of the header.
fn crypt_payload(
    profile: &EnctypeProfile,
    k3: &Keyblock,
    iovs: &mut [CryptoIov<'_>],
    header: usize,
) -> Result<()> {
    let mut stream: Vec<CryptoIov<'_>> = Vec::with_capacity(iovs.len());
    for (i, iov) in iovs.iter_mut().enumerate() {
        if i == header {
            let (_cksum, conf) = iov.data.split_at_mut(CKSUM_LEN);
            stream.push(CryptoIov::new(IovKind::Data, conf));
        } else if iov.kind.is_encrypted() {
            stream.push(CryptoIov::new(IovKind::Data, &mut *iov.data));
        }
    }
    profile.enc.encrypt(k3, None, &mut stream)
}

pub(crate) fn encrypt(
    profile: &EnctypeProfile,
    key: &Key,
    usage: u32,
    _ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    let header = frame(profile, iovs)?;
    let hash = profile
        .hash
        .ok_or(Error::Internal("arcfour enctype without a hash"))?;
    let k1 = usage_key(profile, key, translate_usage(usage))?;

    fill_random(&mut iovs[header].data[CKSUM_LEN..])?;
    let cksum = hmac(hash, &k1, &cksum_parts(iovs, header))?;
    iovs[header].data[..CKSUM_LEN].copy_from_slice(&cksum);

    let k3 = Keyblock::raw(profile.etype, hmac(hash, &k1, &[&cksum])?);
    crypt_payload(profile, &k3, iovs, header)
}

fn try_decrypt(
    profile: &EnctypeProfile,
    key: &Key,
    ms_usage: u32,
    iovs: &mut [CryptoIov<'_>],
    header: usize,
) -> Result<()> {
    let hash = profile
        .hash
        .ok_or(Error::Internal("arcfour enctype without a hash"))?;
    let k1 = usage_key(profile, key, ms_usage)?;

    let mut cksum = [0u8; CKSUM_LEN];
    cksum.copy_from_slice(&iovs[header].data[..CKSUM_LEN]);
    let k3 = Keyblock::raw(profile.etype, hmac(hash, &k1, &[&cksum])?);
    crypt_payload(profile, &k3, iovs, header)?;

    let expect = hmac(hash, &k1, &cksum_parts(iovs, header))?;
    if bool::from(expect.ct_eq(&cksum)) {
        Ok(())
    } else {
        Err(Error::Integrity)
    }
}

pub(crate) fn decrypt(
    profile: &EnctypeProfile,
    key: &Key,
    usage: u32,
    _ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    let header = frame(profile, iovs)?;

    // Usage 9 (TGS-REP subkey) interoperates with peers that encrypted as
    // usage 8, so keep a pristine ciphertext copy for a second attempt.
    let saved: Option<Vec<Vec<u8>>> = if usage == 9 {
        Some(iovs.iter().map(|iov| iov.data.to_vec()).collect())
    } else {
        None
    };

    match try_decrypt(profile, key, translate_usage(usage), iovs, header) {
        Err(Error::Integrity) if usage == 9 => {
            for (iov, orig) in iovs.iter_mut().zip(saved.as_deref().unwrap_or(&[])) {
                iov.data.copy_from_slice(orig);
            }
            try_decrypt(profile, key, 8, iovs, header)
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use crate::dispatch::{decrypt, encrypt};
    use crate::enctype::{ENCTYPE_ARCFOUR_HMAC, ENCTYPE_ARCFOUR_HMAC_EXP};
    use crate::error::Error;
    use crate::key::{Key, Keyblock};

    fn key(etype: i32) -> Key {
        Key::new(Keyblock::new(etype, b"sixteen byte key".to_vec()).unwrap())
    }

    #[test]
    fn arcfour_roundtrip() {
        for etype in [ENCTYPE_ARCFOUR_HMAC, ENCTYPE_ARCFOUR_HMAC_EXP] {
            let k = key(etype);
            let plain = b"stream cipher with an hmac seal".to_vec();
            let blob = encrypt(&k, 1, &plain).unwrap();
            assert_eq!(blob.len(), 24 + plain.len(), "no padding ever");
            assert_eq!(decrypt(&k, 1, &blob).unwrap(), plain);
        }
    }

    #[test]
    fn export_and_full_strength_keys_disagree() {
        let full = key(ENCTYPE_ARCFOUR_HMAC);
        let exp = key(ENCTYPE_ARCFOUR_HMAC_EXP);
        let blob = encrypt(&full, 1, b"grade matters").unwrap();
        assert!(matches!(decrypt(&exp, 1, &blob), Err(Error::Integrity)));
    }

    #[test]
    fn usage_nine_falls_back_to_eight() {
        let k = key(ENCTYPE_ARCFOUR_HMAC);
        let blob = encrypt(&k, 8, b"subkey compat").unwrap();
        assert_eq!(decrypt(&k, 9, &blob).unwrap(), b"subkey compat");
        // Straight usage 9 still works against a usage-9 encryptor.
        let blob9 = encrypt(&k, 9, b"subkey compat").unwrap();
        assert_eq!(decrypt(&k, 9, &blob9).unwrap(), b"subkey compat");
    }

    #[test]
    fn translated_usages_agree() {
        let k = key(ENCTYPE_ARCFOUR_HMAC);
        let blob = encrypt(&k, 3, b"as-rep part").unwrap();
        assert_eq!(decrypt(&k, 8, &blob).unwrap(), b"as-rep part");
    }

    #[test]
    fn checksum_tamper_fails() {
        let k = key(ENCTYPE_ARCFOUR_HMAC);
        let mut blob = encrypt(&k, 1, b"sealed").unwrap();
        blob[2] ^= 0x10;
        assert!(matches!(decrypt(&k, 1, &blob), Err(Error::Integrity)));
    }
}
