//! Cascade update: the forward fix-up pass after a size-changing insert or
//! delete.
//!
//! Changing the byte length of an entry X may change the width its
//! successor Y needs for its own `prev_len` field (1↔5 bytes). This module
//! walks forward from Y, growing fields when required and never shrinking
//! them (the `force_large` path), terminating the first time a field
//! already accommodates the value it needs to hold.

use super::entry::{
    prev_len_width, read_header, write_prev_len_forced_large, PREVLEN_BIG_MARK,
};

/// Fix up `prev_len` fields starting at `y_offset`, given that the entry
/// immediately before it now has byte length `new_prev_len`. `end_offset`
/// is the offset of the end-of-ziplist sentinel byte; the cascade never
/// walks past it.
///
/// No-op if `y_offset == end_offset` (there is no entry to fix).
pub fn run(buf: &mut Vec<u8>, mut y_offset: usize, mut new_prev_len: u32, end_offset_init: usize) {
    let mut end_offset = end_offset_init;
    loop {
        if y_offset >= end_offset {
            return;
        }
        let existing_width = if buf[y_offset] == PREVLEN_BIG_MARK { 5 } else { 1 };
        let needed_width = prev_len_width(new_prev_len);

        if existing_width == needed_width {
            overwrite_prev_len_value(buf, y_offset, existing_width, new_prev_len);
            return;
        }

        if needed_width > existing_width {
            // existing_width must be 1 here: grow the field to 5 bytes,
            // which grows Y's total length by 4 and shifts everything after it.
            let header_before = read_header(buf, y_offset);
            let y_total_before = header_before.total_len();

            // Replace the 1-byte prev_len with a 5-byte one: splice out the
            // old byte, splice in the 5-byte encoding.
            let mut replacement = Vec::with_capacity(5);
            write_prev_len_forced_large(&mut replacement, new_prev_len);
            buf.splice(y_offset..y_offset + 1, replacement);
            end_offset += 4;

            let y_total_after = y_total_before + 4;
            let next_y_offset = y_offset + y_total_after;
            y_offset = next_y_offset;
            new_prev_len = y_total_after as u32;
            continue;
        }

        // needed_width < existing_width: force_large — keep the oversized
        // field, just rewrite the value, and stop (Y's total length did not
        // change, so nothing downstream needs fixing).
        overwrite_prev_len_value(buf, y_offset, existing_width, new_prev_len);
        return;
    }
}

fn overwrite_prev_len_value(buf: &mut [u8], offset: usize, width: usize, value: u32) {
    if width == 1 {
        buf[offset] = value as u8;
    } else {
        buf[offset] = PREVLEN_BIG_MARK;
        buf[offset + 1..offset + 5].copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ziplist::entry::write_prev_len;

    fn entry_with_prev_len(prev_len: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_prev_len(&mut out, prev_len);
        crate::ziplist::entry::encode_payload(&mut out, payload);
        out
    }

    #[test]
    fn same_width_just_overwrites_value() {
        let mut buf = entry_with_prev_len(5, b"hello");
        buf.push(0xFF);
        let end = buf.len() - 1;
        run(&mut buf, 0, 7, end);
        assert_eq!(buf[0], 7);
    }

    #[test]
    fn grows_field_and_continues_to_next_entry() {
        // Y has a 1-byte prev_len but now needs 5 bytes (prior entry grew past 253).
        let mut buf = entry_with_prev_len(10, b"y-payload");
        let y_total_before = buf.len();
        // Z follows Y, referencing Y's old (pre-growth) total length.
        let z_entry = entry_with_prev_len(y_total_before as u32, b"z");
        buf.extend_from_slice(&z_entry);
        buf.push(0xFF);
        let end = buf.len() - 1;

        run(&mut buf, 0, 300, end);

        // Y's prev_len field grew from 1 to 5 bytes (+4 total).
        assert_eq!(buf[0], PREVLEN_BIG_MARK);
        let mut b = [0u8; 4];
        b.copy_from_slice(&buf[1..5]);
        assert_eq!(u32::from_le_bytes(b), 300);

        // Z's prev_len now reflects Y's grown total length.
        let y_total_after = y_total_before + 4;
        let z_offset = 5 + (y_total_before - 1 /* old prev_len width */);
        let (z_prev_len, _) = super::read_header_prev_len_for_test(&buf, z_offset);
        assert_eq!(z_prev_len, y_total_after as u32);
    }

    // Small helper kept local to the test module to avoid widening entry.rs's
    // public surface just for assertions.
    pub(super) fn read_header_prev_len_for_test(buf: &[u8], offset: usize) -> (u32, usize) {
        crate::ziplist::entry::read_prev_len(buf, offset)
    }
}
