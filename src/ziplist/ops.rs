//! The `Ziplist` mutation API: push, insert, delete, find, and merge
//!. Every structural mutation ends by invoking the cascade
//! (`cascade.rs`) to fix up the one `prev_len` field that may now be wrong,
//! then recomputes the whole-blob header fields.

use super::cascade;
use super::cursor::{self, Cursor};
use super::entry::{self, EntryData};
use super::Ziplist;

/// Which end of the list [`Ziplist::push`] inserts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Where {
    Head,
    Tail,
}

impl Ziplist {
    /// Insert `data` at the head or tail, returning a cursor to the new entry.
    pub fn push(&mut self, at: Where, data: &[u8]) -> Cursor {
        let offset = match at {
            Where::Head => self.first_offset(),
            Where::Tail => self.sentinel_offset(),
        };
        self.insert_raw(offset, data)
    }

    /// Insert `data` immediately before the entry named by `cursor`,
    /// returning a cursor to the new entry.
    pub fn insert_before(&mut self, cursor: Cursor, data: &[u8]) -> Cursor {
        self.insert_raw(cursor.0, data)
    }

    fn insert_raw(&mut self, at_offset: usize, data: &[u8]) -> Cursor {
        let new_prev_len: u32 = if at_offset == self.first_offset() {
            0
        } else if at_offset == self.sentinel_offset() {
            self.last()
                .map(|c| entry::read_header(&self.buf, c.0).total_len() as u32)
                .unwrap_or(0)
        } else {
            // `at_offset` names an existing entry X; X's own prev_len value
            // already records the length of the entry that will precede ours.
            entry::read_prev_len(&self.buf, at_offset).0
        };

        let mut new_entry = Vec::new();
        entry::write_prev_len(&mut new_entry, new_prev_len);
        entry::encode_payload(&mut new_entry, data);
        let new_entry_len = new_entry.len();

        self.buf.splice(at_offset..at_offset, new_entry);

        let y_offset = at_offset + new_entry_len;
        let end = self.sentinel_offset();
        cascade::run(&mut self.buf, y_offset, new_entry_len as u32, end);

        self.recompute_header();
        Cursor(at_offset)
    }

    /// Remove the entry at `cursor`.
    pub fn delete(&mut self, cursor: Cursor) {
        let at = cursor.0;
        let header = entry::read_header(&self.buf, at);
        let total = header.total_len();
        let new_prev_len_for_y = header.prev_len;

        self.buf.splice(at..at + total, std::iter::empty());

        let end = self.sentinel_offset();
        cascade::run(&mut self.buf, at, new_prev_len_for_y, end);
        self.recompute_header();
    }

    /// As [`Ziplist::delete`], but updates `cursor` in place to point at the
    /// entry that now follows (or at the end sentinel).
    pub fn delete_at(&mut self, cursor: &mut Cursor) {
        let at = cursor.0;
        self.delete(*cursor);
        *cursor = Cursor(at);
    }

    /// Remove up to `count` consecutive entries starting at logical index
    /// `start_index`. Returns the number of entries actually removed.
    pub fn delete_range(&mut self, start_index: i64, count: usize) -> usize {
        let Some(start_cursor) = self.cursor_at(start_index) else {
            return 0;
        };
        let start_offset = start_cursor.0;
        let mut removed = 0;
        for _ in 0..count {
            if cursor::is_end(&self.buf, start_offset) {
                break;
            }
            self.delete(Cursor(start_offset));
            removed += 1;
        }
        removed
    }

    /// Find the entry equal to `needle`, scanning forward from `start` and
    /// skipping the first `skip` matches. If `needle` parses as a canonical
    /// integer it is compared numerically against integer-encoded entries;
    /// otherwise comparison is byte-exact against string entries only.
    pub fn find(&self, start: Cursor, needle: &[u8], skip: usize) -> Option<Cursor> {
        let needle_int = entry::try_parse_int(needle);
        let mut offset = start.0;
        let mut remaining_skip = skip;
        loop {
            if cursor::is_end(&self.buf, offset) {
                return None;
            }
            if self.entry_equals(offset, needle, needle_int) {
                if remaining_skip == 0 {
                    return Some(Cursor(offset));
                }
                remaining_skip -= 1;
            }
            offset = cursor::next(&self.buf, offset);
        }
    }

    fn entry_equals(&self, offset: usize, needle: &[u8], needle_int: Option<i64>) -> bool {
        let header = entry::read_header(&self.buf, offset);
        match entry::read_data(&self.buf, offset, &header) {
            EntryData::Str(s) => needle_int.is_none() && s == needle,
            EntryData::Int(v) => needle_int == Some(v),
        }
    }

    /// Concatenate `a` then `b` into one ziplist, reusing whichever blob is
    /// larger to bound memory movement and fixing up only the seam entry's
    /// `prev_len` via the cascade.
    pub fn merge(a: Ziplist, b: Ziplist) -> Ziplist {
        if a.buf.len() >= b.buf.len() {
            merge_onto(a, b, Side::Append)
        } else {
            merge_onto(b, a, Side::Prepend)
        }
    }

    fn last_entry_total_len(&self) -> u32 {
        match self.last() {
            None => 0,
            Some(c) => entry::read_header(&self.buf, c.0).total_len() as u32,
        }
    }

    fn entries_bytes(&self) -> Vec<u8> {
        self.buf[self.first_offset()..self.sentinel_offset()].to_vec()
    }
}

enum Side {
    /// `other`'s entries are spliced in after `base`'s entries.
    Append,
    /// `other`'s entries are spliced in before `base`'s entries.
    Prepend,
}

fn merge_onto(mut base: Ziplist, other: Ziplist, side: Side) -> Ziplist {
    let other_entries = other.entries_bytes();
    let other_had_entries = !other_entries.is_empty();

    match side {
        Side::Append => {
            let insert_at = base.sentinel_offset();
            let new_prev_len = base.last_entry_total_len();
            base.buf.splice(insert_at..insert_at, other_entries);
            if other_had_entries {
                let end = base.sentinel_offset();
                cascade::run(&mut base.buf, insert_at, new_prev_len, end);
            }
        }
        Side::Prepend => {
            let insert_at = base.first_offset();
            let seam_offset = insert_at + other_entries.len();
            let new_prev_len = other.last_entry_total_len();
            base.buf.splice(insert_at..insert_at, other_entries);
            if other_had_entries && seam_offset < base.buf.len() - 1 {
                let end = base.buf.len() - 1;
                cascade::run(&mut base.buf, seam_offset, new_prev_len, end);
            }
        }
    }

    base.recompute_header();
    base
}
