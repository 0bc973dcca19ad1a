//! Composite encryption schemes, one module per enctype family.
//!
//! Each family wires a cipher backend and an integrity primitive into the
//! encrypt/decrypt entry points the registry dispatches to. All share the
//! envelope framing rules from `iov`.

pub(crate) mod arcfour;
pub(crate) mod dk_cmac;
pub(crate) mod dk_hmac;
pub(crate) mod etm;
pub(crate) mod old;
pub(crate) mod raw;

use rand::RngCore;

use crate::enctype::EnctypeProfile;
use crate::error::{Error, Result};
use crate::iov::{locate, validate_shape, CryptoIov, IovKind};

pub(crate) fn fill_random(buf: &mut [u8]) -> Result<()> {
    rand::thread_rng()
        .try_fill_bytes(buf)
        .map_err(|_| Error::Random)
}

/// Locate the header and trailer segments and check both against the
/// profile's exact framing lengths.
pub(crate) fn check_frame(
    profile: &EnctypeProfile,
    iovs: &[CryptoIov<'_>],
) -> Result<(usize, usize)> {
    validate_shape(iovs)?;
    let header = locate(iovs, IovKind::Header)?;
    if iovs[header].data.len() != profile.crypto_length(IovKind::Header)? {
        return Err(Error::BadMessageSize);
    }
    let trailer = locate(iovs, IovKind::Trailer)?;
    if iovs[trailer].data.len() != profile.crypto_length(IovKind::Trailer)? {
        return Err(Error::BadMessageSize);
    }
    Ok((header, trailer))
}
