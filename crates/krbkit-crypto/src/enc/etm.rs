//! RFC 8009 aes-sha2 family: encrypt-then-MAC. The tag covers the initial
//! cipher state and the ciphertext, so decryption never touches
//! unauthenticated bytes.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{check_frame, fill_random};
use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::hmac::hmac;
use crate::iov::{sign_parts, CryptoIov};
use crate::kdf::{
    derive_key, derive_random, usage_constant, SEED_ENCRYPTION, SEED_INTEGRITY,
};
use crate::key::Key;

fn integrity_key(profile: &EnctypeProfile, key: &Key, usage: u32) -> Result<Zeroizing<Vec<u8>>> {
    // Ki's length is the tag length, not the enctype key length, so it
    // bypasses the keyblock cache and stays a raw byte string.
    derive_random(
        key.keyblock(),
        &usage_constant(usage, SEED_INTEGRITY),
        profile.derive_alg,
        profile.tag_len,
    )
}

fn initial_state(profile: &EnctypeProfile, ivec: &Option<&mut [u8]>) -> Vec<u8> {
    match ivec {
        Some(iv) => iv.to_vec(),
        None => vec![0u8; profile.enc.block_size()],
    }
}

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
        .ok_or(Error::Internal("encrypt-then-MAC enctype without a hash"))?;

    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;
    let ki = integrity_key(profile, key, usage)?;

    fill_random(iovs[header].data)?;

    let iv0 = initial_state(profile, &ivec);
    profile.enc.encrypt(ke.keyblock(), ivec, iovs)?;

    let mut parts: Vec<&[u8]> = Vec::with_capacity(iovs.len() + 1);
    parts.push(&iv0);
    parts.extend(sign_parts(iovs));
    let tag = hmac(hash, &ki, &parts)?;
    drop(parts);
    iovs[trailer].data.copy_from_slice(&tag[..profile.tag_len]);
    Ok(())
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
        .ok_or(Error::Internal("encrypt-then-MAC enctype without a hash"))?;

    let ke = derive_key(key, &usage_constant(usage, SEED_ENCRYPTION), profile.derive_alg)?;
    let ki = integrity_key(profile, key, usage)?;

    let iv0 = initial_state(profile, &ivec);
    let mut parts: Vec<&[u8]> = Vec::with_capacity(iovs.len() + 1);
    parts.push(&iv0);
    parts.extend(sign_parts(iovs));
    let tag = hmac(hash, &ki, &parts)?;
    drop(parts);
    if !bool::from(tag[..profile.tag_len].ct_eq(iovs[trailer].data)) {
        return Err(Error::Integrity);
    }

    profile.enc.decrypt(ke.keyblock(), ivec, iovs)
}
