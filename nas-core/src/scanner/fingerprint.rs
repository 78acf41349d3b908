//! Content fingerprint (spec.md §4.6 step 2): a similarity hint, never a
//! collision-resistant digest. Two files with the same size and matching
//! head/tail samples are *probably*, never certainly, equal content.

use sha2::{Digest, Sha256};

/// How many bytes to sample from the head and tail of a file of `size`
/// bytes, given a sample window of `sample_kib` KiB per end. When the file
/// is small enough that the two windows would overlap, only the head
/// window (equal to the whole file) is read and the tail is skipped.
pub fn sample_plan(size: i64, sample_kib: u64) -> (u64, u64) {
    let n = sample_kib * 1024;
    let size = size.max(0) as u64;
    if size <= 2 * n {
        (size, 0)
    } else {
        (n, n)
    }
}

/// `SHA-256(decimal(size) ‖ head ‖ tail)`, truncated to its leading 16 hex
/// characters.
pub fn fingerprint(size: i64, head: &[u8], tail: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(size.to_string().as_bytes());
    hasher.update(head);
    hasher.update(tail);
    let digest = hasher.finalize();
    let hex = hex_encode(&digest);
    hex[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_file_reads_only_head() {
        let (head, tail) = sample_plan(100, 64);
        assert_eq!(head, 100);
        assert_eq!(tail, 0);
    }

    #[test]
    fn large_file_samples_both_ends() {
        let n = 64 * 1024;
        let (head, tail) = sample_plan((4 * n) as i64, 64);
        assert_eq!(head, n as u64);
        assert_eq!(tail, n as u64);
    }

    #[test]
    fn boundary_at_exactly_two_n_reads_whole_file_once() {
        let n = 64 * 1024;
        let (head, tail) = sample_plan((2 * n) as i64, 64);
        assert_eq!(head, (2 * n) as u64);
        assert_eq!(tail, 0);
    }

    #[test]
    fn same_content_same_size_yields_same_fingerprint() {
        let a = fingerprint(1000, b"head-bytes", b"tail-bytes");
        let b = fingerprint(1000, b"head-bytes", b"tail-bytes");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn different_size_same_regions_yields_different_fingerprint() {
        let a = fingerprint(1000, b"head-bytes", b"tail-bytes");
        let b = fingerprint(2000, b"head-bytes", b"tail-bytes");
        assert_ne!(a, b);
    }

    #[test]
    fn different_tail_yields_different_fingerprint() {
        let a = fingerprint(1000, b"head-bytes", b"tail-one");
        let b = fingerprint(1000, b"head-bytes", b"tail-two");
        assert_ne!(a, b);
    }
}
