//! Hash providers over the RustCrypto digest crates.

use digest::Digest;

use crate::error::{Error, Result};
use crate::provider::HashProvider;

fn digest_into<D: Digest>(data: &[&[u8]], out: &mut [u8]) -> Result<()> {
    if out.len() != <D as Digest>::output_size() {
        return Err(Error::BadMessageSize);
    }
    let mut d = D::new();
    for part in data {
        d.update(part);
    }
    out.copy_from_slice(&d.finalize());
    Ok(())
}

macro_rules! hash_provider {
    ($name:ident, $digest:ty, $label:literal, $hash_size:expr, $block_size:expr) => {
        pub struct $name;

        impl HashProvider for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn hash_size(&self) -> usize {
                $hash_size
            }

            fn block_size(&self) -> usize {
                $block_size
            }

            fn hash(&self, data: &[&[u8]], out: &mut [u8]) -> Result<()> {
                digest_into::<$digest>(data, out)
            }
        }
    };
}

hash_provider!(Md4Hash, md4::Md4, "md4", 16, 64);
hash_provider!(Md5Hash, md5::Md5, "md5", 16, 64);
hash_provider!(Sha1Hash, sha1::Sha1, "sha1", 20, 64);
hash_provider!(Sha256Hash, sha2::Sha256, "sha256", 32, 64);
hash_provider!(Sha384Hash, sha2::Sha384, "sha384", 48, 128);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_part_input_hashes_as_one_stream() {
        let mut whole = [0u8; 20];
        Sha1Hash.hash(&[b"abc"], &mut whole).unwrap();
        let mut parts = [0u8; 20];
        Sha1Hash.hash(&[b"a", b"", b"bc"], &mut parts).unwrap();
        assert_eq!(whole, parts);
        // SHA-1("abc"), FIPS 180 example.
        assert_eq!(
            hex::encode(whole),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn wrong_output_length_rejected() {
        let mut out = [0u8; 16];
        assert!(Sha1Hash.hash(&[b"x"], &mut out).is_err());
    }
}
