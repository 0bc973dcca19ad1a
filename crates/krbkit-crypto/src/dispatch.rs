//! Registry-dispatched entry points for the public operations.
//!
//! Every operation resolves the key's enctype to its profile row and calls
//! through the function pointers there. The convenience byte-slice wrappers
//! around the scatter/gather core live here too.

use zeroize::Zeroizing;

use crate::cksumtype::{find_cksumtype, find_cksumtype_by_name};
use crate::enc;
use crate::enctype::{
    find_enctype, find_enctype_by_name, EnctypeProfile, ETYPE_DEPRECATED, ETYPE_WEAK,
};
use crate::error::{Error, Result};
use crate::iov::{total_length, CryptoIov, IovKind};
use crate::key::{Key, Keyblock};

/// Encrypt a framed envelope in place under `key`.
///
/// `cipher_state`, when supplied, chains the cipher across messages; it is
/// updated to the state after this message.
pub fn encrypt_iov(
    key: &Key,
    usage: u32,
    cipher_state: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    let profile = find_enctype(key.enctype())?;
    tracing::debug!(
        enctype = profile.name,
        usage,
        len = total_length(iovs, false),
        "encrypt"
    );
    (profile.encrypt)(profile, key, usage, cipher_state, iovs)
}

/// Decrypt a framed envelope (or a single stream segment) in place.
///
/// A `Stream` segment holds a whole undecomposed token; it is split at the
/// profile's header and trailer lengths and the `Data` segment is pointed at
/// the plaintext inside the stream buffer.
pub fn decrypt_iov<'a>(
    key: &Key,
    usage: u32,
    cipher_state: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'a>],
) -> Result<()> {
    let profile = find_enctype(key.enctype())?;
    tracing::debug!(
        enctype = profile.name,
        usage,
        len = total_length(iovs, false),
        "decrypt"
    );
    if iovs.iter().any(|iov| iov.kind == IovKind::Stream) {
        return stream_decrypt(profile, key, usage, cipher_state, iovs);
    }
    (profile.decrypt)(profile, key, usage, cipher_state, iovs)
}

fn stream_decrypt<'a>(
    profile: &EnctypeProfile,
    key: &Key,
    usage: u32,
    cipher_state: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'a>],
) -> Result<()> {
    let mut stream = None;
    let mut data = None;
    for (i, iov) in iovs.iter().enumerate() {
        match iov.kind {
            IovKind::Stream if stream.is_none() => stream = Some(i),
            IovKind::Data if data.is_none() => data = Some(i),
            IovKind::Empty => {}
            _ => return Err(Error::BadMessageSize),
        }
    }
    let (si, di) = match (stream, data) {
        (Some(si), Some(di)) => (si, di),
        _ => return Err(Error::BadMessageSize),
    };

    let hlen = profile.crypto_length(IovKind::Header)?;
    let tlen = profile.crypto_length(IovKind::Trailer)?;
    let buf = std::mem::take(&mut iovs[si].data);
    if buf.len() < hlen + tlen {
        return Err(Error::BadMessageSize);
    }
    let datalen = buf.len() - hlen - tlen;
    let (header, rest) = buf.split_at_mut(hlen);
    let (payload, trailer) = rest.split_at_mut(datalen);
    let mut inner = [
        CryptoIov::new(IovKind::Header, header),
        CryptoIov::new(IovKind::Data, payload),
        CryptoIov::new(IovKind::Trailer, trailer),
    ];
    (profile.decrypt)(profile, key, usage, cipher_state, &mut inner)?;
    let [_, plaintext, _] = inner;
    iovs[di].data = plaintext.data;
    Ok(())
}

fn padding_for(profile: &EnctypeProfile, data_len: usize) -> Result<usize> {
    let granule = profile.crypto_length(IovKind::Padding)?;
    if granule <= 1 {
        return Ok(0);
    }
    let header = profile.crypto_length(IovKind::Header)?;
    Ok((granule - (header + data_len) % granule) % granule)
}

/// Header, padding, and trailer lengths for a payload of `data_len` bytes.
pub fn required_lengths(enctype: i32, data_len: usize) -> Result<(usize, usize, usize)> {
    let profile = find_enctype(enctype)?;
    Ok((
        profile.crypto_length(IovKind::Header)?,
        padding_for(profile, data_len)?,
        profile.crypto_length(IovKind::Trailer)?,
    ))
}

/// Total ciphertext size produced for a payload of `data_len` bytes.
pub fn encrypt_length(enctype: i32, data_len: usize) -> Result<usize> {
    let (header, pad, trailer) = required_lengths(enctype, data_len)?;
    Ok(header + data_len + pad + trailer)
}

/// Exact length of one framing segment kind for an enctype.
pub fn crypto_length(enctype: i32, kind: IovKind) -> Result<usize> {
    find_enctype(enctype)?.crypto_length(kind)
}

/// Encrypt `plaintext` into a freshly allocated token:
/// header || ciphertext || trailer.
pub fn encrypt(key: &Key, usage: u32, plaintext: &[u8]) -> Result<Vec<u8>> {
    let profile = find_enctype(key.enctype())?;
    let (hlen, pad, tlen) = required_lengths(profile.etype, plaintext.len())?;
    let mut buf = vec![0u8; hlen + plaintext.len() + pad + tlen];
    buf[hlen..hlen + plaintext.len()].copy_from_slice(plaintext);

    let (header, rest) = buf.split_at_mut(hlen);
    let (data, rest) = rest.split_at_mut(plaintext.len());
    let (padding, trailer) = rest.split_at_mut(pad);
    let mut iovs = [
        CryptoIov::new(IovKind::Header, header),
        CryptoIov::new(IovKind::Data, data),
        CryptoIov::new(IovKind::Padding, padding),
        CryptoIov::new(IovKind::Trailer, trailer),
    ];
    (profile.encrypt)(profile, key, usage, None, &mut iovs)?;
    Ok(buf)
}

/// Decrypt a token produced by [`encrypt`]. The result still carries any
/// zero padding the enctype added; framed callers that must recover the
/// exact payload length use the scatter/gather API instead.
pub fn decrypt(key: &Key, usage: u32, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let profile = find_enctype(key.enctype())?;
    let hlen = profile.crypto_length(IovKind::Header)?;
    let tlen = profile.crypto_length(IovKind::Trailer)?;
    if ciphertext.len() < hlen + tlen {
        return Err(Error::BadMessageSize);
    }
    let mut buf = ciphertext.to_vec();
    let datalen = buf.len() - hlen - tlen;
    let (header, rest) = buf.split_at_mut(hlen);
    let (data, trailer) = rest.split_at_mut(datalen);
    let mut iovs = [
        CryptoIov::new(IovKind::Header, header),
        CryptoIov::new(IovKind::Data, data),
        CryptoIov::new(IovKind::Trailer, trailer),
    ];
    (profile.decrypt)(profile, key, usage, None, &mut iovs)?;
    Ok(buf[hlen..hlen + datalen].to_vec())
}

/// Generate a fresh key from the system RNG.
pub fn make_random_key(enctype: i32) -> Result<Keyblock> {
    let profile = find_enctype(enctype)?;
    let mut seed = Zeroizing::new(vec![0u8; profile.enc.keybytes()]);
    enc::fill_random(&mut seed)?;
    (profile.rand2key)(profile, &seed)
}

/// Convert `keybytes` of pseudo-random seed into a protocol key.
pub fn random_to_key(enctype: i32, seed: &[u8]) -> Result<Keyblock> {
    let profile = find_enctype(enctype)?;
    (profile.rand2key)(profile, seed)
}

/// Derive a key from a password and salt with the enctype's default
/// parameters.
pub fn string_to_key(enctype: i32, password: &str, salt: &[u8]) -> Result<Keyblock> {
    string_to_key_with_params(enctype, password, salt, None)
}

/// Derive a key from a password and salt. `params` is the opaque
/// per-enctype parameter string (a big-endian iteration count for the
/// PBKDF2 families); `None` or empty selects the default.
pub fn string_to_key_with_params(
    enctype: i32,
    password: &str,
    salt: &[u8],
    params: Option<&[u8]>,
) -> Result<Keyblock> {
    let profile = find_enctype(enctype)?;
    tracing::debug!(enctype = profile.name, "string-to-key");
    (profile.str2key)(profile, password, salt, params)
}

/// The enctype's pseudo-random function over `input`, `prf_length` bytes.
pub fn prf(key: &Key, input: &[u8]) -> Result<Vec<u8>> {
    let profile = find_enctype(key.enctype())?;
    let f = profile
        .prf
        .ok_or(Error::InvalidParameter("enctype has no pseudo-random function"))?;
    let mut out = vec![0u8; profile.prf_length];
    f(profile, key, input, &mut out)?;
    Ok(out)
}

/// Output length of [`prf`] for an enctype.
pub fn prf_length(enctype: i32) -> Result<usize> {
    Ok(find_enctype(enctype)?.prf_length)
}

/// Initial cipher state for an IV-chained message sequence under `key`.
pub fn init_state(key: &Key) -> Result<Vec<u8>> {
    let profile = find_enctype(key.enctype())?;
    if profile.iv_from_key {
        Ok(key.contents().to_vec())
    } else {
        Ok(profile.enc.init_state())
    }
}

pub fn is_weak(enctype: i32) -> Result<bool> {
    Ok(find_enctype(enctype)?.flags & ETYPE_WEAK != 0)
}

pub fn is_deprecated(enctype: i32) -> Result<bool> {
    Ok(find_enctype(enctype)?.flags & ETYPE_DEPRECATED != 0)
}

pub fn enctype_name(enctype: i32) -> Result<&'static str> {
    Ok(find_enctype(enctype)?.name)
}

pub fn string_to_enctype(name: &str) -> Result<i32> {
    Ok(find_enctype_by_name(name)?.etype)
}

pub fn cksumtype_name(cktype: i32) -> Result<&'static str> {
    Ok(find_cksumtype(cktype)?.name)
}

pub fn string_to_cksumtype(name: &str) -> Result<i32> {
    Ok(find_cksumtype_by_name(name)?.cktype)
}
