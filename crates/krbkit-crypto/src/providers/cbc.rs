//! Generic CBC and CBC-CTS over any RustCrypto block cipher.
//!
//! The CTS variant is the Kerberos one (CS-3 of SP800-38A addendum): the
//! last two ciphertext blocks are unconditionally reversed, even when the
//! plaintext is an exact block multiple. The evolving cipher state handed
//! back through `ivec` is the ciphertext of the final CBC step, which in
//! output order is the next-to-last block.

use cipher::generic_array::GenericArray;
use cipher::{BlockDecrypt, BlockEncrypt, BlockSizeUser};
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::iov::{total_length, CryptoIov, IovCursor};

const MAX_BLOCK: usize = 16;

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

fn enc_block<C: BlockEncrypt>(cipher: &C, block: &mut [u8]) {
    cipher.encrypt_block(GenericArray::from_mut_slice(block));
}

fn dec_block<C: BlockDecrypt>(cipher: &C, block: &mut [u8]) {
    cipher.decrypt_block(GenericArray::from_mut_slice(block));
}

fn load_chain(ivec: &Option<&mut [u8]>, bs: usize) -> [u8; MAX_BLOCK] {
    let mut chain = [0u8; MAX_BLOCK];
    if let Some(iv) = ivec {
        chain[..bs].copy_from_slice(iv);
    }
    chain
}

fn store_chain(ivec: Option<&mut [u8]>, chain: &[u8]) {
    if let Some(iv) = ivec {
        iv.copy_from_slice(chain);
    }
}

/// Plain CBC encryption of the encrypt-relevant segments; total length must
/// be a block multiple. Uses the cursor's in-place fast path on contiguous
/// runs, falling back to the copy path across segment boundaries.
pub(crate) fn cbc_encrypt<C>(
    cipher: &C,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()>
where
    C: BlockEncrypt + BlockSizeUser,
{
    let bs = C::block_size();
    let total = total_length(iovs, false);
    if total % bs != 0 {
        return Err(Error::BadMessageSize);
    }
    let mut chain = load_chain(&ivec, bs);
    let mut remaining = total / bs;
    let mut cursor = IovCursor::new(iovs, bs, false);
    while remaining > 0 {
        if let Some((idx, off, nblocks)) = cursor.contiguous_run(iovs, remaining) {
            let run = &mut iovs[idx].data[off..off + nblocks * bs];
            for block in run.chunks_exact_mut(bs) {
                xor_into(block, &chain[..bs]);
                enc_block(cipher, block);
                chain[..bs].copy_from_slice(block);
            }
            remaining -= nblocks;
        } else {
            let mut block = [0u8; MAX_BLOCK];
            cursor.get_block(iovs, &mut block[..bs]);
            xor_into(&mut block[..bs], &chain[..bs]);
            enc_block(cipher, &mut block[..bs]);
            chain[..bs].copy_from_slice(&block[..bs]);
            cursor.put_block(iovs, &block[..bs]);
            remaining -= 1;
        }
    }
    store_chain(ivec, &chain[..bs]);
    chain.zeroize();
    Ok(())
}

/// Plain CBC decryption, mirroring `cbc_encrypt`.
pub(crate) fn cbc_decrypt<C>(
    cipher: &C,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()>
where
    C: BlockDecrypt + BlockSizeUser,
{
    let bs = C::block_size();
    let total = total_length(iovs, false);
    if total % bs != 0 {
        return Err(Error::BadMessageSize);
    }
    let mut chain = load_chain(&ivec, bs);
    let mut remaining = total / bs;
    let mut cursor = IovCursor::new(iovs, bs, false);
    while remaining > 0 {
        if let Some((idx, off, nblocks)) = cursor.contiguous_run(iovs, remaining) {
            let run = &mut iovs[idx].data[off..off + nblocks * bs];
            for block in run.chunks_exact_mut(bs) {
                let mut saved = [0u8; MAX_BLOCK];
                saved[..bs].copy_from_slice(block);
                dec_block(cipher, block);
                xor_into(block, &chain[..bs]);
                chain = saved;
            }
            remaining -= nblocks;
        } else {
            let mut block = [0u8; MAX_BLOCK];
            cursor.get_block(iovs, &mut block[..bs]);
            let mut saved = [0u8; MAX_BLOCK];
            saved[..bs].copy_from_slice(&block[..bs]);
            dec_block(cipher, &mut block[..bs]);
            xor_into(&mut block[..bs], &chain[..bs]);
            chain = saved;
            cursor.put_block(iovs, &block[..bs]);
            remaining -= 1;
        }
    }
    store_chain(ivec, &chain[..bs]);
    chain.zeroize();
    Ok(())
}

/// CBC with Kerberos ciphertext stealing. Requires at least one block of
/// input (the confounder guarantees this for well-formed messages).
pub(crate) fn cts_encrypt<C>(
    cipher: &C,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()>
where
    C: BlockEncrypt + BlockSizeUser,
{
    let bs = C::block_size();
    let total = total_length(iovs, false);
    if total < bs {
        return Err(Error::BadMessageSize);
    }
    let nblocks = total.div_ceil(bs);
    let mut chain = load_chain(&ivec, bs);
    let mut cursor = IovCursor::new(iovs, bs, false);

    if nblocks == 1 {
        let mut block = [0u8; MAX_BLOCK];
        cursor.get_block(iovs, &mut block[..bs]);
        xor_into(&mut block[..bs], &chain[..bs]);
        enc_block(cipher, &mut block[..bs]);
        cursor.put_block(iovs, &block[..bs]);
        store_chain(ivec, &block[..bs]);
        block.zeroize();
        return Ok(());
    }

    // CBC over all blocks (last one zero-padded by the cursor), holding back
    // the final two ciphertext blocks so they can be written reversed.
    let mut prev = [0u8; MAX_BLOCK]; // ciphertext i-1, not yet written
    let mut prev2 = [0u8; MAX_BLOCK]; // ciphertext i-2, not yet written
    for i in 0..nblocks {
        let mut block = [0u8; MAX_BLOCK];
        cursor.get_block(iovs, &mut block[..bs]);
        xor_into(&mut block[..bs], &chain[..bs]);
        enc_block(cipher, &mut block[..bs]);
        chain[..bs].copy_from_slice(&block[..bs]);
        if i >= 2 {
            cursor.put_block(iovs, &prev2[..bs]);
        }
        prev2 = prev;
        prev = block;
    }
    // Swap: the final CBC block lands where the penultimate one would have,
    // and the penultimate block is truncated into the tail position.
    cursor.put_block(iovs, &prev[..bs]);
    cursor.put_block(iovs, &prev2[..bs]);
    store_chain(ivec, &prev[..bs]);
    prev.zeroize();
    prev2.zeroize();
    chain.zeroize();
    Ok(())
}

/// Inverse of `cts_encrypt`.
pub(crate) fn cts_decrypt<C>(
    cipher: &C,
    ivec: Option<&mut [u8]>,
    iovs: &mut [CryptoIov<'_>],
) -> Result<()>
where
    C: BlockEncrypt + BlockDecrypt + BlockSizeUser,
{
    let bs = C::block_size();
    let total = total_length(iovs, false);
    if total < bs {
        return Err(Error::BadMessageSize);
    }
    let nblocks = total.div_ceil(bs);
    let lastlen = total - (nblocks - 1) * bs;
    let mut chain = load_chain(&ivec, bs);
    let mut cursor = IovCursor::new(iovs, bs, false);

    if nblocks == 1 {
        let mut block = [0u8; MAX_BLOCK];
        cursor.get_block(iovs, &mut block[..bs]);
        let mut saved = [0u8; MAX_BLOCK];
        saved[..bs].copy_from_slice(&block[..bs]);
        dec_block(cipher, &mut block[..bs]);
        xor_into(&mut block[..bs], &chain[..bs]);
        cursor.put_block(iovs, &block[..bs]);
        store_chain(ivec, &saved[..bs]);
        block.zeroize();
        return Ok(());
    }

    // All blocks before the stolen pair decrypt as ordinary CBC.
    for _ in 0..nblocks - 2 {
        let mut block = [0u8; MAX_BLOCK];
        cursor.get_block(iovs, &mut block[..bs]);
        let mut saved = [0u8; MAX_BLOCK];
        saved[..bs].copy_from_slice(&block[..bs]);
        dec_block(cipher, &mut block[..bs]);
        xor_into(&mut block[..bs], &chain[..bs]);
        chain = saved;
        cursor.put_block(iovs, &block[..bs]);
    }

    // b1 holds the final CBC ciphertext block; b2 the truncated penultimate.
    let mut b1 = [0u8; MAX_BLOCK];
    let mut b2 = [0u8; MAX_BLOCK];
    cursor.get_block(iovs, &mut b1[..bs]);
    cursor.get_block(iovs, &mut b2[..bs]);

    // Decrypting b1 exposes the zero-padded tail of the stolen block, which
    // reconstructs the full penultimate ciphertext block.
    let mut d = [0u8; MAX_BLOCK];
    d[..bs].copy_from_slice(&b1[..bs]);
    dec_block(cipher, &mut d[..bs]);
    let mut cn1 = [0u8; MAX_BLOCK];
    cn1[..lastlen].copy_from_slice(&b2[..lastlen]);
    cn1[lastlen..bs].copy_from_slice(&d[lastlen..bs]);

    let mut pn1 = [0u8; MAX_BLOCK];
    pn1[..bs].copy_from_slice(&cn1[..bs]);
    dec_block(cipher, &mut pn1[..bs]);
    xor_into(&mut pn1[..bs], &chain[..bs]);

    let mut pn = [0u8; MAX_BLOCK];
    for i in 0..lastlen {
        pn[i] = d[i] ^ cn1[i];
    }

    cursor.put_block(iovs, &pn1[..bs]);
    cursor.put_block(iovs, &pn[..bs]);
    store_chain(ivec, &b1[..bs]);
    for buf in [&mut d, &mut cn1, &mut pn1, &mut pn, &mut chain] {
        buf.zeroize();
    }
    Ok(())
}

/// CBC-MAC: chain through `data` (a block multiple in total) and emit the
/// final chaining value.
pub(crate) fn cbc_mac<C>(
    cipher: &C,
    data: &[&[u8]],
    ivec: Option<&[u8]>,
    out: &mut [u8],
) -> Result<()>
where
    C: BlockEncrypt + BlockSizeUser,
{
    let bs = C::block_size();
    let total: usize = data.iter().map(|d| d.len()).sum();
    if total == 0 || total % bs != 0 || out.len() != bs {
        return Err(Error::BadMessageSize);
    }
    let mut chain = [0u8; MAX_BLOCK];
    if let Some(iv) = ivec {
        chain[..bs].copy_from_slice(iv);
    }
    let mut block = [0u8; MAX_BLOCK];
    let mut filled = 0;
    for part in data {
        for &byte in *part {
            block[filled] = byte;
            filled += 1;
            if filled == bs {
                xor_into(&mut chain[..bs], &block[..bs]);
                enc_block(cipher, &mut chain[..bs]);
                filled = 0;
            }
        }
    }
    out.copy_from_slice(&chain[..bs]);
    chain.zeroize();
    block.zeroize();
    Ok(())
}
