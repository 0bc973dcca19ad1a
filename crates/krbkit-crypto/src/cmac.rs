//! CMAC (RFC 4493 / NIST SP800-38B) over a 128-bit block cipher provider.
//!
//! Subkeys come from doubling E(0) in GF(2^128) with the 0x87 reduction
//! constant. The provider only needs its `cbc_mac` capability: one CBC-MAC
//! step per message block gives exactly the chaining CMAC requires.

use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::key::Keyblock;
use crate::provider::EncProvider;

const BLOCK: usize = 16;
const REDUCTION: u8 = 0x87;

fn double(block: &mut [u8; BLOCK]) {
    let msb = block[0] & 0x80;
    let mut carry = 0u8;
    for b in block.iter_mut().rev() {
        let next = (*b & 0x80) >> 7;
        *b = (*b << 1) | carry;
        carry = next;
    }
    if msb != 0 {
        block[BLOCK - 1] ^= REDUCTION;
    }
}

/// Compute CMAC(key, data...), a full one-block tag.
///
/// `data` is the already-selected signing-relevant byte stream (callers pick
/// segments in signing order, so SIGN_ONLY regions get authenticated without
/// ever being encrypted).
pub fn cmac(enc: &dyn EncProvider, key: &Keyblock, data: &[&[u8]]) -> Result<Vec<u8>> {
    if enc.block_size() != BLOCK {
        return Err(Error::InvalidParameter("CMAC requires a 128-bit block cipher"));
    }

    // Subkey generation: L = E(0), K1 = 2L, K2 = 4L.
    let mut k1 = [0u8; BLOCK];
    enc.cbc_mac(key, &[&[0u8; BLOCK]], None, &mut k1)?;
    double(&mut k1);
    let mut k2 = k1;
    double(&mut k2);

    let total: usize = data.iter().map(|d| d.len()).sum();
    let nblocks = total.div_ceil(BLOCK).max(1);
    let whole = total != 0 && total % BLOCK == 0;

    let mut tag = [0u8; BLOCK];
    let mut block = [0u8; BLOCK];
    let mut filled = 0;
    let mut done = 0;
    for part in data {
        for &byte in *part {
            block[filled] = byte;
            filled += 1;
            if filled == BLOCK {
                done += 1;
                if done < nblocks {
                    let prev = tag;
                    enc.cbc_mac(key, &[&block], Some(&prev), &mut tag)?;
                    filled = 0;
                }
            }
        }
    }

    // Last block: XOR K1 if it was complete, else pad 0x80 and XOR K2.
    if whole {
        for i in 0..BLOCK {
            block[i] ^= k1[i];
        }
    } else {
        block[filled] = 0x80;
        block[filled + 1..].fill(0);
        for i in 0..BLOCK {
            block[i] ^= k2[i];
        }
    }
    let mut out = vec![0u8; BLOCK];
    let tag_in = tag;
    enc.cbc_mac(key, &[&block], Some(&tag_in), &mut out)?;

    k1.zeroize();
    k2.zeroize();
    tag.zeroize();
    block.zeroize();
    Ok(out)
}
