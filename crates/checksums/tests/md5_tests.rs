//! Integration tests for the MD5 implementation: RFC 1321 vectors plus a
//! handful of streaming/chunking edge cases.

use checksums::strong::{Md5, StrongDigest};

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
    }
    out
}

#[test]
fn rfc1321_vectors() {
    let vectors = [
        (b"".as_slice(), "d41d8cd98f00b204e9800998ecf8427e"),
        (b"a".as_slice(), "0cc175b9c0f1b6a831c399e269772661"),
        (b"abc".as_slice(), "900150983cd24fb0d6963f7d28e17f72"),
        (
            b"message digest".as_slice(),
            "f96b697d7cb7938d525a2f31aaf161d0",
        ),
        (
            b"abcdefghijklmnopqrstuvwxyz".as_slice(),
            "c3fcd3d76192e4007dfb496cca67e13b",
        ),
    ];

    for (input, expected) in vectors {
        assert_eq!(to_hex(&Md5::digest(input)), expected);
    }
}

#[test]
fn streaming_matches_one_shot_across_block_boundaries() {
    for size in [0usize, 1, 55, 56, 63, 64, 65, 119, 120, 1024, 64 * 1024] {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        let one_shot = Md5::digest(&data);

        let mut streaming = Md5::new();
        for chunk in data.chunks(7) {
            streaming.update(chunk);
        }
        assert_eq!(streaming.finalize(), one_shot, "mismatch at size {size}");
    }
}

#[test]
fn trait_api_matches_inherent_api() {
    let input = b"trait parity check";
    let via_trait = <Md5 as StrongDigest>::digest(input);
    let inherent = Md5::digest(input);
    assert_eq!(via_trait, inherent);
}

#[test]
fn distinct_inputs_produce_distinct_digests() {
    assert_ne!(Md5::digest(b"test"), Md5::digest(b"Test"));
    assert_ne!(Md5::digest(b"test"), Md5::digest(b"test "));
}

#[test]
fn digest_is_deterministic() {
    let data = b"determinism check";
    assert_eq!(Md5::digest(data), Md5::digest(data));
}
