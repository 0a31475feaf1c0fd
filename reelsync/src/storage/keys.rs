// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Byte-key layout of the cache tree
//!
//! ```text
//! item/<partition>/<position: u64 BE>   cached rows, position-ordered
//! cursor/<partition>                    pagination cursor
//! home/<partition>/<index: u32 BE>      bounded home-row entries
//! ```
//!
//! `<partition>` is the category and the language, each prefixed with its length as a
//! big-endian u64. Length prefixes keep partitions disjoint: `("popular", "en")` can never
//! be a key prefix of `("popular", "en-US")`.

use crate::model::PartitionKey;

const ITEM_TAG: &[u8] = b"item/";
const CURSOR_TAG: &[u8] = b"cursor/";
const HOME_TAG: &[u8] = b"home/";

fn push_segment(buf: &mut Vec<u8>, segment: &str) {
    let bytes = segment.as_bytes();
    // usize never exceeds u64, so the whole segment is always written
    buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn partition_bytes(tag: &[u8], partition: &PartitionKey) -> Vec<u8> {
    let mut buf = Vec::with_capacity(tag.len() + 16 + partition.language.len() + 16);
    buf.extend_from_slice(tag);
    push_segment(&mut buf, partition.category.path());
    push_segment(&mut buf, &partition.language);
    buf.push(b'/');
    buf
}

/// Prefix shared by every row of the partition
pub fn item_prefix(partition: &PartitionKey) -> Vec<u8> {
    partition_bytes(ITEM_TAG, partition)
}

pub fn item_key(partition: &PartitionKey, position: u64) -> Vec<u8> {
    let mut key = item_prefix(partition);
    key.extend_from_slice(&position.to_be_bytes());
    key
}

/// Position encoded in the tail of an item key
pub fn position_of(key: &[u8]) -> Option<u64> {
    let tail: [u8; 8] = key.get(key.len().checked_sub(8)?..)?.try_into().ok()?;
    Some(u64::from_be_bytes(tail))
}

pub fn cursor_key(partition: &PartitionKey) -> Vec<u8> {
    partition_bytes(CURSOR_TAG, partition)
}

/// Prefix of every cursor in the tree
pub fn cursor_namespace() -> &'static [u8] {
    CURSOR_TAG
}

/// Prefix of every cached row in the tree
pub fn item_namespace() -> &'static [u8] {
    ITEM_TAG
}

pub fn home_prefix(partition: &PartitionKey) -> Vec<u8> {
    partition_bytes(HOME_TAG, partition)
}

pub fn home_key(partition: &PartitionKey, index: u32) -> Vec<u8> {
    let mut key = home_prefix(partition);
    key.extend_from_slice(&index.to_be_bytes());
    key
}
