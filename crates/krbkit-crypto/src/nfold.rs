//! RFC 3961 n-fold: stretch or shrink a byte string to an arbitrary length
//! by repeating it, rotating each repetition right by 13 bits, and summing
//! the repetitions with ones-complement addition. Used to adapt derivation
//! constants to a cipher's block size. Input and output lengths must be
//! whole bytes (the protocol never needs sub-byte lengths).

fn lcm(a: usize, b: usize) -> usize {
    fn gcd(mut a: usize, mut b: usize) -> usize {
        while b != 0 {
            (a, b) = (b, a % b);
        }
        a
    }
    a / gcd(a, b) * b
}

/// Fold `input` to exactly `outlen` bytes. `input` must be non-empty.
pub fn nfold(input: &[u8], outlen: usize) -> Vec<u8> {
    let inlen = input.len();
    debug_assert!(inlen > 0 && outlen > 0);
    let mut out = vec![0u8; outlen];
    let reps = lcm(inlen, outlen);

    // MSB-first accumulation with deferred carry, walking the virtual
    // 13-bit-rotated repetitions from the last byte backward.
    let mut carry: u32 = 0;
    for i in (0..reps).rev() {
        // Position of this output byte's most significant bit within the
        // (i / inlen)-times-rotated copy of the input.
        let msbit = ((inlen * 8 - 1) + ((inlen * 8 + 13) * (i / inlen)) + ((inlen - (i % inlen)) * 8))
            % (inlen * 8);
        let hi = input[((inlen - 1) - (msbit / 8)) % inlen] as u32;
        let lo = input[(inlen - (msbit / 8)) % inlen] as u32;
        let byte = (((hi << 8) | lo) >> ((msbit % 8) + 1)) & 0xff;

        carry += byte + out[i % outlen] as u32;
        out[i % outlen] = (carry & 0xff) as u8;
        carry >>= 8;
    }
    // Propagate the final ones-complement carry.
    if carry != 0 {
        for i in (0..outlen).rev() {
            carry += out[i] as u32;
            out[i] = (carry & 0xff) as u8;
            carry >>= 8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 3961 appendix A.1 vectors.
    #[test]
    fn rfc3961_vectors() {
        let cases: &[(&[u8], usize, &str)] = &[
            (b"012345", 8, "be072631276b1955"),
            (b"password", 7, "78a07b6caf85fa"),
            (b"Rough Consensus, and Running Code", 8, "bb6ed30870b7f0e0"),
            (
                b"password",
                21,
                "59e4a8ca7c0385c3c37b3f6d2000247cb6e6bd5b70",
            ),
            (
                b"MASSACHVSETTS INSTITVTE OF TECHNOLOGY",
                24,
                "db3b0d8f0b061e603282b308a50841229ad798fab9540c1b",
            ),
            (b"Q", 21, "518a54a215a8452a518a54a215a8452a518a54a215"),
            (b"ba", 21, "fb25d531ae8974499f52fd92ea9857c4ba24cf297e"),
        ];
        for (input, outlen, expect) in cases {
            assert_eq!(
                hex::encode(nfold(input, *outlen)),
                *expect,
                "n-fold of {:?} to {} bytes",
                String::from_utf8_lossy(input),
                outlen
            );
        }
    }

    // The "kerberos" constant at the widths the string-to-key algorithms
    // actually use (RFC 3961 appendix A.1).
    #[test]
    fn kerberos_constant_widths() {
        assert_eq!(hex::encode(nfold(b"kerberos", 8)), "6b65726265726f73");
        assert_eq!(
            hex::encode(nfold(b"kerberos", 16)),
            "6b65726265726f737b9b5b2b93132b93"
        );
        assert_eq!(
            hex::encode(nfold(b"kerberos", 21)),
            "8372c236344e5f1550cd0747e15d62ca7a5a3bcea4"
        );
        assert_eq!(
            hex::encode(nfold(b"kerberos", 32)),
            "6b65726265726f737b9b5b2b93132b935c9bdcdad95c9899c4cae4dee6d6cae4"
        );
    }

    #[test]
    fn identity_when_lengths_match() {
        // A single repetition with zero rotation is the input itself.
        assert_eq!(nfold(b"kerberos", 8), b"kerberos");
    }
}
