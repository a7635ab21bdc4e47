//! Content hashing of serialized values.
//!
//! The hash of a value is computed over its serialized form: one FNV-1 hash over
//! the canonical tree text (compact, keys sorted), one over the binary buffer, and
//! a final FNV-1 hash over both 64-bit results (little-endian). Sorting the keys
//! makes the hash independent of the order fields were pushed in. Equal hashes mean
//! probably-equal content; the hash is not cryptographic.

use crate::error::Result;
use crate::ser::Serializer;
use crate::transfer::Transfer;
use crate::tree;

/// FNV-1 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
/// FNV-1 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1 (multiply, then xor) over `data`.
pub fn fnv1(data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= u64::from(byte);
    }
    hash
}

/// Combines the text and binary hashes into the content hash.
pub fn combine(text_hash: u64, binary_hash: u64) -> u64 {
    let mut both = [0u8; 16];
    both[..8].copy_from_slice(&text_hash.to_le_bytes());
    both[8..].copy_from_slice(&binary_hash.to_le_bytes());
    fnv1(&both)
}

/// Content hash of whatever `f` writes into a fresh serializer.
pub fn hash_with<F>(f: F) -> Result<u64>
where
    F: FnOnce(&mut Serializer) -> Result<()>,
{
    let mut ser = Serializer::new();
    f(&mut ser)?;
    let text = tree::canonical_text(ser.tree())?;
    Ok(combine(fnv1(text.as_bytes()), fnv1(ser.binary().as_bytes())))
}

/// Content hash of `value`.
pub fn hash<T: Transfer + ?Sized>(value: &T) -> Result<u64> {
    hash_with(|ser| ser.write_value(value))
}

/// True if `lhs` and `rhs` have the same content hash.
pub fn equals<T: Transfer + ?Sized>(lhs: &T, rhs: &T) -> Result<bool> {
    Ok(hash(lhs)? == hash(rhs)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1_of_empty_input_is_offset_basis() {
        assert_eq!(fnv1(&[]), FNV_OFFSET_BASIS);
    }

    #[test]
    fn fnv1_multiplies_before_xor() {
        let expected = FNV_OFFSET_BASIS.wrapping_mul(FNV_PRIME) ^ u64::from(b'a');
        assert_eq!(fnv1(b"a"), expected);
        // FNV-1a would xor first.
        let fnv1a = (FNV_OFFSET_BASIS ^ u64::from(b'a')).wrapping_mul(FNV_PRIME);
        assert_ne!(fnv1(b"a"), fnv1a);
    }

    #[test]
    fn binary_content_changes_the_hash() {
        let a = hash_with(|s| s.push_bytes("b", b"one").map(|_| ())).expect("hash a");
        let b = hash_with(|s| s.push_bytes("b", b"two").map(|_| ())).expect("hash b");
        let a_again = hash_with(|s| s.push_bytes("b", b"one").map(|_| ())).expect("hash a");
        assert_ne!(a, b);
        assert_eq!(a, a_again);
    }
}
