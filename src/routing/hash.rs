//! Origin extraction and hashing.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// First segment of a resource path: `/docs/readme` → `docs`.
///
/// Paths without a leading segment (`/`, empty) yield `""`.
pub fn origin(path: &str) -> &str {
    path.split('/').nth(1).unwrap_or("")
}

/// 32-bit FNV-1a. Unseeded, so it is stable across processes and restarts.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Shard index for `path` among `shards` shards.
pub fn shard_for(path: &str, shards: usize) -> usize {
    debug_assert!(shards > 0, "shard count must be positive");
    fnv1a(origin(path).as_bytes()) as usize % shards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_first_segment() {
        assert_eq!(origin("/docs/readme"), "docs");
        assert_eq!(origin("/docs"), "docs");
        assert_eq!(origin("/"), "");
        assert_eq!(origin(""), "");
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn same_origin_same_shard() {
        for shards in 1..8 {
            let first = shard_for("/docs/readme", shards);
            assert_eq!(shard_for("/docs/other", shards), first);
            assert_eq!(shard_for("/docs", shards), first);
            assert!(first < shards);
        }
    }
}
