//! Ziplist: the compact single-allocation encoding used for small lists,
//! hashes, and sorted sets.
//!
//! Layout: `<zlbytes:u32><zltail:u32><zllen:u16>` header, followed by
//! entries, followed by a single `0xFF` end-of-ziplist sentinel byte. Every
//! multi-byte header field is little-endian, like the entry fields
//! themselves (`entry.rs`).
//!
//! This module is split by concern, one file per piece: `entry.rs` is the
//! single-entry codec, `cursor.rs` is offset navigation, `cascade.rs` is
//! the prev_len fix-up walk, and `ops.rs` is the `Ziplist` mutation API
//! built on top of all three.

pub mod cascade;
pub mod cursor;
pub mod entry;
pub mod ops;

pub use cursor::Cursor;
pub use entry::EntryData;
pub use ops::Where;

/// Byte length of the fixed header: `zlbytes` (4) + `zltail` (4) + `zllen` (2).
pub const HEADER_LEN: usize = 10;

/// A single contiguous byte blob encoding a small list, hash, or zset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ziplist {
    buf: Vec<u8>,
}

impl Ziplist {
    /// An empty ziplist: header plus a bare end sentinel.
    pub fn new() -> Self {
        let mut buf = vec![0u8; HEADER_LEN];
        buf.push(entry::ZLEND);
        let mut zl = Ziplist { buf };
        zl.recompute_header();
        zl
    }

    /// Total blob length in bytes (the `zlbytes` header field).
    pub fn blob_len(&self) -> usize {
        self.buf.len()
    }

    /// Number of entries. Exact even past the `zllen` u16 saturation point.
    pub fn len(&self) -> usize {
        self.walk_count_and_tail().0
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw blob, e.g. for wire transfer or snapshotting.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Rebuild a `Ziplist` from a blob produced by [`Ziplist::as_bytes`].
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Ziplist { buf }
    }

    pub fn first_offset(&self) -> usize {
        HEADER_LEN
    }

    pub fn sentinel_offset(&self) -> usize {
        self.buf.len() - 1
    }

    fn zltail(&self) -> usize {
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.buf[4..8]);
        u32::from_le_bytes(b) as usize
    }

    /// Walks the whole entry chain once, returning `(count, tail_offset)`.
    /// `tail_offset` equals [`Ziplist::sentinel_offset`] when empty.
    ///
    /// Ziplists only ever hold the handful of entries below the
    /// upgrade-to-full-encoding threshold, so a full O(n)
    /// walk per mutation is the same cost class as the encode itself.
    fn walk_count_and_tail(&self) -> (usize, usize) {
        let mut offset = self.first_offset();
        let mut count = 0usize;
        let mut tail = self.sentinel_offset();
        while !cursor::is_end(&self.buf, offset) {
            tail = offset;
            count += 1;
            offset = cursor::next(&self.buf, offset);
        }
        (count, tail)
    }

    /// Recompute `zlbytes`/`zltail`/`zllen` from the current entry chain.
    /// Called after every structural mutation.
    fn recompute_header(&mut self) {
        let (count, tail) = self.walk_count_and_tail();
        let zlbytes = self.buf.len() as u32;
        let zltail = tail as u32;
        let zllen = count.min(u16::MAX as usize) as u16;
        self.buf[0..4].copy_from_slice(&zlbytes.to_le_bytes());
        self.buf[4..8].copy_from_slice(&zltail.to_le_bytes());
        self.buf[8..10].copy_from_slice(&zllen.to_le_bytes());
    }

    pub fn cursor_at(&self, index: i64) -> Option<Cursor> {
        cursor::index(
            &self.buf,
            index,
            self.first_offset(),
            self.zltail(),
            self.sentinel_offset(),
        )
        .map(Cursor)
    }

    pub fn get(&self, cursor: Cursor) -> EntryData<'_> {
        let header = entry::read_header(&self.buf, cursor.0);
        entry::read_data(&self.buf, cursor.0, &header)
    }

    pub fn first(&self) -> Option<Cursor> {
        self.cursor_at(0)
    }

    pub fn last(&self) -> Option<Cursor> {
        self.cursor_at(-1)
    }

    pub fn next(&self, cursor: Cursor) -> Option<Cursor> {
        let n = cursor::next(&self.buf, cursor.0);
        if cursor::is_end(&self.buf, n) {
            None
        } else {
            Some(Cursor(n))
        }
    }

    pub fn prev(&self, cursor: Cursor) -> Option<Cursor> {
        cursor::prev(&self.buf, cursor.0, self.first_offset()).map(Cursor)
    }
}

impl Default for Ziplist {
    fn default() -> Self {
        Self::new()
    }
}
