//! Raw CBC with no confounder and no integrity tag. Only keytab and KDC
//! database plumbing should ever reach for these enctypes.

use crate::enctype::EnctypeProfile;
use crate::error::Result;
use crate::iov::{validate_shape, CryptoIov};
use crate::key::Key;

pub(crate) fn encrypt(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    validate_shape(iovs)?;
    profile.enc.encrypt(key.keyblock(), ivec, iovs)
}

pub(crate) fn decrypt(
    profile: &EnctypeProfile,
    key: &Key,
    _usage: u32,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()> {
    validate_shape(iovs)?;
    profile.enc.decrypt(key.keyblock(), ivec, iovs)
}
