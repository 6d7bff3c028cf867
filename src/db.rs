//! The metadata index behind [`Document`](crate::Document).
//!
//! One fixed-size [`DbRow`] per token, stored flat in document order.
//! Container rows are appended with an unknown size and backpatched when the
//! matching end token arrives; both the start and the end row then carry the
//! subtree's row span, so any subtree can be skipped in O(1).
//!
//! Rows are addressed by row index. The byte offset of a row inside the packed
//! table is `index * ROW_SIZE`.

use crate::token::{ContainerKind, TokenType};
use crate::{Error, Result};

pub(crate) const ROW_SIZE: usize = 12;

/// Size value of a container that has not been closed yet.
pub(crate) const UNKNOWN_SIZE: u32 = 0x7FFF_FFFF;

const COMPLEX_BIT: u32 = 0x8000_0000;
const SIZE_MASK: u32 = 0x7FFF_FFFF;
const ROWS_MASK: u32 = 0x07FF_FFFF;
const TYPE_SHIFT: u32 = 27;

/// Largest subtree row span a row can record.
pub(crate) const MAX_ROWS: usize = ROWS_MASK as usize;

/// One token in the index.
///
/// - `location`: byte offset of the value (scalars, after any prefix or
///   opening quote) or of the token itself (containers)
/// - `size_or_length`: value length for scalars, member count for containers;
///   the high bit is the complex-children flag
/// - `rows_and_type`: subtree row span in the low 27 bits, token type in the
///   high 5 bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub(crate) struct DbRow {
    location: u32,
    size_or_length: u32,
    rows_and_type: u32,
}

const _: () = assert!(std::mem::size_of::<DbRow>() == ROW_SIZE);

impl DbRow {
    fn new(token: TokenType, location: u32, size: u32, complex: bool) -> Self {
        DbRow {
            location,
            size_or_length: (size & SIZE_MASK) | if complex { COMPLEX_BIT } else { 0 },
            rows_and_type: ((token as u32) << TYPE_SHIFT) | 1,
        }
    }

    #[inline]
    pub(crate) fn location(&self) -> usize {
        self.location as usize
    }

    #[inline]
    pub(crate) fn size_or_length(&self) -> usize {
        (self.size_or_length & SIZE_MASK) as usize
    }

    /// Escaped string, hex binary, or a container whose children are not one row each.
    #[inline]
    pub(crate) fn has_complex_children(&self) -> bool {
        self.size_or_length & COMPLEX_BIT != 0
    }

    /// Row span: 1 for scalars, end index minus start index for containers.
    #[inline]
    pub(crate) fn number_of_rows(&self) -> usize {
        (self.rows_and_type & ROWS_MASK) as usize
    }

    #[inline]
    pub(crate) fn token_type(&self) -> TokenType {
        TokenType::from_u8((self.rows_and_type >> TYPE_SHIFT) as u8)
    }
}

/// Saved counters of the enclosing scope while a container is open.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StackRow {
    pub(crate) start_index: usize,
    pub(crate) kind: ContainerKind,
    pub(crate) prior_count: usize,
    pub(crate) prior_escaped_names: bool,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MetadataDb {
    rows: Vec<DbRow>,
}

impl MetadataDb {
    /// Sizes the table for `input_len` bytes of text.
    pub(crate) fn with_capacity(input_len: usize) -> Result<Self> {
        if input_len > i32::MAX as usize {
            return Err(Error::invalid_value(format!(
                "input of {input_len} bytes exceeds the index limit of {} bytes",
                i32::MAX
            )));
        }
        Ok(MetadataDb {
            rows: Vec::with_capacity(input_len / 4 + 1),
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Bytes used by the packed rows.
    pub(crate) fn byte_length(&self) -> usize {
        self.rows.len() * ROW_SIZE
    }

    /// Appends a row and returns its index.
    pub(crate) fn append(&mut self, token: TokenType, location: usize, length: usize, complex: bool) -> usize {
        let size = if token.is_start() {
            UNKNOWN_SIZE
        } else {
            length as u32
        };
        self.rows
            .push(DbRow::new(token, location as u32, size, complex));
        self.rows.len() - 1
    }

    #[inline]
    pub(crate) fn row(&self, index: usize) -> DbRow {
        self.rows[index]
    }

    pub(crate) fn set_length(&mut self, index: usize, length: usize) {
        let row = &mut self.rows[index];
        debug_assert!(length < UNKNOWN_SIZE as usize);
        row.size_or_length = (row.size_or_length & COMPLEX_BIT) | (length as u32 & SIZE_MASK);
    }

    pub(crate) fn set_number_of_rows(&mut self, index: usize, rows: usize) {
        let row = &mut self.rows[index];
        row.rows_and_type = (row.rows_and_type & !ROWS_MASK) | (rows as u32 & ROWS_MASK);
    }

    pub(crate) fn set_has_complex_children(&mut self, index: usize) {
        self.rows[index].size_or_length |= COMPLEX_BIT;
    }

    /// Index of the end row of the container at `index`, or one past it.
    /// For scalars: `index` itself, or the next row.
    #[inline]
    pub(crate) fn end_index(&self, index: usize, include_end: bool) -> usize {
        let row = self.rows[index];
        let last = if row.token_type().is_start() {
            index + row.number_of_rows()
        } else {
            index
        };
        if include_end {
            last + 1
        } else {
            last
        }
    }

    /// Copies rows `start..end` into a new table with locations rebased so
    /// that `base` becomes offset zero.
    pub(crate) fn copy_segment(&self, start: usize, end: usize, base: usize) -> MetadataDb {
        let rows = self.rows[start..end]
            .iter()
            .map(|row| DbRow {
                location: row.location - base as u32,
                ..*row
            })
            .collect();
        MetadataDb { rows }
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.rows.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_packing() {
        let mut db = MetadataDb::default();
        let i = db.append(TokenType::String, 17, 5, true);
        let row = db.row(i);
        assert_eq!(row.location(), 17);
        assert_eq!(row.size_or_length(), 5);
        assert!(row.has_complex_children());
        assert_eq!(row.number_of_rows(), 1);
        assert_eq!(row.token_type(), TokenType::String);
    }

    #[test]
    fn test_backpatch() {
        let mut db = MetadataDb::default();
        let start = db.append(TokenType::StartArray, 0, 0, false);
        assert_eq!(db.row(start).size_or_length(), UNKNOWN_SIZE as usize);
        db.append(TokenType::Number, 1, 1, false);
        db.append(TokenType::Number, 4, 1, false);
        let end = db.append(TokenType::EndArray, 5, 0, false);
        db.set_length(start, 2);
        db.set_number_of_rows(start, end - start);
        db.set_number_of_rows(end, end - start);

        assert_eq!(db.row(start).size_or_length(), 2);
        assert!(!db.row(start).has_complex_children());
        assert_eq!(db.end_index(start, false), end);
        assert_eq!(db.end_index(start, true), end + 1);
        assert_eq!(db.row(end).number_of_rows(), 3);
        assert_eq!(db.byte_length(), 4 * ROW_SIZE);
    }

    #[test]
    fn test_complex_flag_survives_length_update() {
        let mut db = MetadataDb::default();
        let start = db.append(TokenType::StartSet, 0, 0, false);
        db.set_has_complex_children(start);
        db.set_length(start, 7);
        assert!(db.row(start).has_complex_children());
        assert_eq!(db.row(start).size_or_length(), 7);
    }

    #[test]
    fn test_copy_segment_rebases() {
        let mut db = MetadataDb::default();
        db.append(TokenType::StartArray, 0, 0, false);
        db.append(TokenType::String, 10, 3, false);
        db.append(TokenType::BigInteger, 20, 2, false);
        let copy = db.copy_segment(1, 3, 9);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.row(0).location(), 1);
        assert_eq!(copy.row(1).location(), 11);
        assert_eq!(copy.row(1).token_type(), TokenType::BigInteger);
    }
}
