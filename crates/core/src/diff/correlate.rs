//! Line correlation — decide whether a line in the old version and a line
//! in the new version denote the same logical line, given only the hunks
//! between the two versions.

use super::Hunk;

fn in_hunk(line: u32, start: u32, lines: u32) -> bool {
    line >= start && line < start + lines
}

/// Whether `line` precedes the hunk. A zero-length hunk is a pure
/// insertion/deletion with no line of its own, so `start` itself still
/// counts as "above".
fn above_hunk(line: u32, start: u32, lines: u32) -> bool {
    if lines == 0 {
        line <= start
    } else {
        line < start
    }
}

fn under_hunk(line: u32, start: u32, lines: u32) -> bool {
    if lines == 0 {
        line > start
    } else {
        line >= start + lines
    }
}

/// Whether `new_line` in the new version and `old_line` in the old version
/// are the same code, judged from `hunks` in file order.
///
/// Walks the hunks tracking the end of the last fully passed hunk on each
/// side (`new_prev`/`old_prev`). A line strictly inside a hunk's new range
/// was touched by an edit and can never match. A line above the current
/// hunk is resolved immediately using only the hunks already passed: both
/// sides must sit above, at the same offset from their anchors. Once every
/// hunk is passed, the same offset check decides.
pub fn same_line(new_line: u32, old_line: u32, hunks: &[Hunk]) -> bool {
    let mut new_prev: i64 = 0;
    let mut old_prev: i64 = 0;

    for hunk in hunks {
        if in_hunk(new_line, hunk.new_pos, hunk.new_lines) {
            return false;
        } else if above_hunk(new_line, hunk.new_pos, hunk.new_lines) {
            return above_hunk(old_line, hunk.old_pos, hunk.old_lines)
                && i64::from(new_line) - new_prev == i64::from(old_line) - old_prev;
        } else if !under_hunk(old_line, hunk.old_pos, hunk.old_lines) {
            // new_line is already past this hunk but old_line is not:
            // the two cannot refer to the same code
            return false;
        }

        // Both lines are past this hunk; advance the anchors to its end.
        // A zero-length hunk occupies no lines, so it must not shift the
        // anchor past its position.
        new_prev = i64::from(hunk.new_pos) + i64::from(hunk.new_lines);
        if hunk.new_lines > 0 {
            new_prev -= 1;
        }
        old_prev = i64::from(hunk.old_pos) + i64::from(hunk.old_lines);
        if hunk.old_lines > 0 {
            old_prev -= 1;
        }
    }

    i64::from(new_line) - new_prev == i64::from(old_line) - old_prev
}
