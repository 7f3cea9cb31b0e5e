//! Cluster key routing.
//!
//! Keys map to one of 16384 hash slots using CRC16 (XMODEM), the same scheme
//! Redis Cluster uses. When a key contains a non-empty `{...}` section only
//! that section is hashed, so related keys can be pinned to one slot.

/// Number of hash slots in a cluster.
pub const SLOT_COUNT: u16 = 16384;

/// CRC16/XMODEM: polynomial 0x1021, initial value 0, no reflection.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// The part of a key that is hashed.
fn hash_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        if let Some(len) = key[open + 1..].iter().position(|&b| b == b'}') {
            if len > 0 {
                return &key[open + 1..open + 1 + len];
            }
        }
    }
    key
}

/// Hash slot for a key.
pub fn key_slot(key: &str) -> u16 {
    crc16(hash_tag(key.as_bytes())) % SLOT_COUNT
}

/// Index of the shard owning `slot` when slots are split into `shards`
/// contiguous, near-equal ranges.
pub fn shard_for_slot(slot: u16, shards: usize) -> usize {
    debug_assert!(shards > 0);
    (slot as usize * shards) / SLOT_COUNT as usize
}
