//! HMAC (RFC 2104) over any hash provider.
//!
//! Built generically on the `HashProvider` capability rather than a concrete
//! digest type, because the MAC a message uses is chosen at runtime by the
//! enctype registry. Keys longer than the hash block are rejected; the
//! composite algorithms pre-hash where their wire format calls for it.

use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::provider::HashProvider;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Compute HMAC(key, data...) at the hash's full output size.
pub fn hmac(hash: &dyn HashProvider, key: &[u8], data: &[&[u8]]) -> Result<Vec<u8>> {
    let block = hash.block_size();
    if key.len() > block {
        return Err(Error::BadKeySize);
    }

    let mut ipad = Zeroizing::new(vec![IPAD; block]);
    let mut opad = Zeroizing::new(vec![OPAD; block]);
    for (i, &k) in key.iter().enumerate() {
        ipad[i] ^= k;
        opad[i] ^= k;
    }

    let mut inner = Zeroizing::new(vec![0u8; hash.hash_size()]);
    let mut parts: Vec<&[u8]> = Vec::with_capacity(data.len() + 1);
    parts.push(&ipad);
    parts.extend_from_slice(data);
    hash.hash(&parts, &mut inner)?;

    let mut out = vec![0u8; hash.hash_size()];
    hash.hash(&[&opad, &inner], &mut out)?;
    Ok(out)
}
