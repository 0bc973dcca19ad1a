//! Scatter/gather message segments and the block cursor over them.
//!
//! A Kerberos message envelope is a list of labeled segments: a header for
//! the confounder, the payload, optional padding, the integrity trailer, and
//! optionally sign-only regions that are authenticated but never encrypted.
//! The cursor presents the encryption-relevant (or signing-relevant) subset
//! of those segments as one flat block stream, with independent read and
//! write positions so ciphertext-stealing can read one block ahead of where
//! it writes.

use crate::error::{Error, Result};

/// The role a buffer segment plays in a message envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IovKind {
    /// Ignored by every operation.
    Empty,
    /// Message payload. Encrypted and signed.
    Data,
    /// Confounder (and, for legacy enctypes, the embedded checksum).
    Header,
    /// Authenticated but not encrypted.
    SignOnly,
    /// Zero fill up to the cipher block size. Encrypted and signed.
    Padding,
    /// Integrity tag.
    Trailer,
    /// Standalone checksum output (checksum API only).
    Checksum,
    /// A whole undecomposed token; split into header/data/trailer before
    /// decryption. Mutually exclusive with the framed kinds.
    Stream,
}

impl IovKind {
    /// Segments a cipher walks: header, payload, padding.
    pub fn is_encrypted(self) -> bool {
        matches!(self, IovKind::Data | IovKind::Header | IovKind::Padding)
    }

    /// Segments a MAC walks: everything encrypted plus sign-only regions.
    pub fn is_signed(self) -> bool {
        self.is_encrypted() || self == IovKind::SignOnly
    }
}

/// One segment of a message envelope.
pub struct CryptoIov<'a> {
    pub kind: IovKind,
    pub data: &'a mut [u8],
}

impl<'a> CryptoIov<'a> {
    pub fn new(kind: IovKind, data: &'a mut [u8]) -> Self {
        CryptoIov { kind, data }
    }
}

fn relevant(kind: IovKind, signing: bool) -> bool {
    if signing {
        kind.is_signed()
    } else {
        kind.is_encrypted()
    }
}

/// Total byte count of the segments an operation will touch.
pub fn total_length(iovs: &[CryptoIov<'_>], signing: bool) -> usize {
    iovs.iter()
        .filter(|iov| relevant(iov.kind, signing))
        .map(|iov| iov.data.len())
        .sum()
}

/// Borrow the signing-relevant segments, in list order.
pub fn sign_parts<'b, 'a>(iovs: &'b [CryptoIov<'a>]) -> Vec<&'b [u8]> {
    iovs.iter()
        .filter(|iov| iov.kind.is_signed())
        .map(|iov| &*iov.data)
        .collect()
}

/// Index of the single segment of `kind`, or an error if absent.
/// The framed kinds may appear at most once per envelope.
pub fn locate(iovs: &[CryptoIov<'_>], kind: IovKind) -> Result<usize> {
    let mut found = None;
    for (i, iov) in iovs.iter().enumerate() {
        if iov.kind == kind {
            if found.is_some() {
                return Err(Error::BadMessageSize);
            }
            found = Some(i);
        }
    }
    found.ok_or(Error::BadMessageSize)
}

/// A block-oriented reader/writer over the relevant segments of an envelope.
///
/// Read (`get_block`) and write (`put_block`) positions advance
/// independently. Positions are held as (segment index, offset) pairs; the
/// cursor never borrows the segments themselves, so a caller may alternate
/// shared reads and exclusive writes on the same list.
pub struct IovCursor {
    block_size: usize,
    signing: bool,
    get_iov: usize,
    get_off: usize,
    put_iov: usize,
    put_off: usize,
}

impl IovCursor {
    pub fn new(iovs: &[CryptoIov<'_>], block_size: usize, signing: bool) -> Self {
        let start = iovs
            .iter()
            .position(|iov| relevant(iov.kind, signing) && !iov.data.is_empty())
            .unwrap_or(iovs.len());
        IovCursor {
            block_size,
            signing,
            get_iov: start,
            get_off: 0,
            put_iov: start,
            put_off: 0,
        }
    }

    fn skip_irrelevant(&self, iovs: &[CryptoIov<'_>], mut iov: usize, off: usize) -> (usize, usize) {
        let mut off = off;
        while iov < iovs.len() {
            let seg = &iovs[iov];
            if relevant(seg.kind, self.signing) && off < seg.data.len() {
                break;
            }
            iov += 1;
            off = 0;
        }
        (iov, off)
    }

    /// Fill `block` (exactly `block_size` bytes) from the stream, zero-padding
    /// a short final block. Returns false only when no bytes remain at all.
    pub fn get_block(&mut self, iovs: &[CryptoIov<'_>], block: &mut [u8]) -> bool {
        debug_assert_eq!(block.len(), self.block_size);
        let mut filled = 0;
        while filled < self.block_size {
            let (iov, off) = self.skip_irrelevant(iovs, self.get_iov, self.get_off);
            self.get_iov = iov;
            self.get_off = off;
            if iov == iovs.len() {
                break;
            }
            let seg = &iovs[iov].data[off..];
            let n = seg.len().min(self.block_size - filled);
            block[filled..filled + n].copy_from_slice(&seg[..n]);
            filled += n;
            self.get_off += n;
        }
        if filled == 0 {
            return false;
        }
        block[filled..].fill(0);
        true
    }

    /// Write up to `block_size` bytes back at the put position, stopping at
    /// the end of the stream (which truncates a final stolen block).
    pub fn put_block(&mut self, iovs: &mut [CryptoIov<'_>], block: &[u8]) {
        debug_assert_eq!(block.len(), self.block_size);
        let mut written = 0;
        while written < self.block_size {
            let (iov, off) = self.skip_irrelevant(iovs, self.put_iov, self.put_off);
            self.put_iov = iov;
            self.put_off = off;
            if iov == iovs.len() {
                break;
            }
            let seg = &mut iovs[iov].data[off..];
            let n = seg.len().min(self.block_size - written);
            seg[..n].copy_from_slice(&block[written..written + n]);
            written += n;
            self.put_off += n;
        }
    }

    /// Detect a run of whole blocks that is contiguous in memory at a point
    /// where read and write positions coincide, so a block mode can operate
    /// on it in place. Returns (segment index, offset, block count) and
    /// advances both positions past the run. Output is identical to the
    /// get/put copy path.
    pub fn contiguous_run(
        &mut self,
        iovs: &[CryptoIov<'_>],
        max_blocks: usize,
    ) -> Option<(usize, usize, usize)> {
        if (self.get_iov, self.get_off) != (self.put_iov, self.put_off) {
            return None;
        }
        let (iov, off) = self.skip_irrelevant(iovs, self.get_iov, self.get_off);
        self.get_iov = iov;
        self.get_off = off;
        self.put_iov = iov;
        self.put_off = off;
        if iov == iovs.len() {
            return None;
        }
        let avail = iovs[iov].data.len() - off;
        let nblocks = (avail / self.block_size).min(max_blocks);
        if nblocks == 0 {
            return None;
        }
        let len = nblocks * self.block_size;
        self.get_off += len;
        self.put_off += len;
        Some((iov, off, nblocks))
    }
}

/// Validate the envelope shape shared by every composite algorithm: at most
/// one each of header/trailer/padding/checksum/stream, and stream exclusive
/// with the framed kinds.
pub(crate) fn validate_shape(iovs: &[CryptoIov<'_>]) -> Result<()> {
    let mut counts = [0usize; 5];
    let mut framed = false;
    for iov in iovs {
        match iov.kind {
            IovKind::Header => counts[0] += 1,
            IovKind::Trailer => counts[1] += 1,
            IovKind::Padding => counts[2] += 1,
            IovKind::Checksum => counts[3] += 1,
            IovKind::Stream => counts[4] += 1,
            IovKind::Data | IovKind::SignOnly => framed = true,
            IovKind::Empty => {}
        }
    }
    if counts[..4].iter().any(|&c| c > 1) || counts[4] > 1 {
        return Err(Error::BadMessageSize);
    }
    if counts[4] == 1 && (counts[0] + counts[1] + counts[2] + counts[3] > 0 || framed) {
        // A stream must be split into framed segments before a composite
        // algorithm sees it; the stream adapter owns that split.
        return Err(Error::BadMessageSize);
    }
    Ok(())
}
