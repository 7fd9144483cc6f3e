//! Text splicing

use crate::error::{PatchError, Result};

/// Insert `block` into `original` at byte `offset`
pub fn splice(original: &str, offset: usize, block: &str) -> Result<String> {
    if offset > original.len() || !original.is_char_boundary(offset) {
        return Err(PatchError::OffsetOutOfRange {
            offset,
            len: original.len(),
        });
    }

    let (head, tail) = original.split_at(offset);
    let mut spliced = String::with_capacity(original.len() + block.len());
    spliced.push_str(head);
    spliced.push_str(block);
    spliced.push_str(tail);
    Ok(spliced)
}
