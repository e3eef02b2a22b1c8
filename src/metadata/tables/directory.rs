//! `#~` stream header decoding and physical row access.

use strum::IntoEnumIterator;

use crate::{
    file::parser::Parser,
    metadata::{
        tables::{
            layout::{CodedIndexKind, SizeContext},
            IndexWidths, TableId,
        },
        token::Token,
    },
    Result,
};

/// Decoded `#~` stream: row counts, row sizes and base offsets for every
/// present table.
///
/// Row access is positional: [`TableDirectory::row`] seeks a [`RowCursor`] to
/// the start of one row, and the cursor's column reads apply the
/// module-specific index widths.
pub struct TableDirectory<'a> {
    data: &'a [u8],
    context: SizeContext,
    offsets: [usize; 64],
}

impl<'a> TableDirectory<'a> {
    /// Parses the `#~` stream header and lays out all present tables.
    ///
    /// Row counts are consumed for every bit set in the valid mask,
    /// including table ids this crate does not model; those can only trail
    /// the known set, so earlier table offsets stay exact.
    ///
    /// # Errors
    /// Returns an error when the header is truncated or a declared table
    /// range exceeds the stream.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut parser = Parser::new(data);

        let _reserved = parser.read_le::<u32>()?;
        let _major = parser.read_le::<u8>()?;
        let _minor = parser.read_le::<u8>()?;
        let heap_sizes = parser.read_le::<u8>()?;
        let _padding = parser.read_le::<u8>()?;
        let valid = parser.read_le::<u64>()?;
        let _sorted = parser.read_le::<u64>()?;

        let mut row_counts = [0u32; 64];
        for (bit, count) in row_counts.iter_mut().enumerate() {
            if valid & (1u64 << bit) != 0 {
                *count = parser.read_le::<u32>()?;
            }
        }

        let context = SizeContext {
            heap: IndexWidths {
                string: if heap_sizes & 0x01 != 0 { 4 } else { 2 },
                guid: if heap_sizes & 0x02 != 0 { 4 } else { 2 },
                blob: if heap_sizes & 0x04 != 0 { 4 } else { 2 },
            },
            row_counts,
        };

        let mut offsets = [0usize; 64];
        let mut cursor = parser.pos();
        for id in TableId::iter() {
            let index = id as usize;
            if row_counts[index] == 0 {
                continue;
            }
            offsets[index] = cursor;
            let table_bytes = context.row_size(id) * row_counts[index] as usize;
            cursor = cursor.checked_add(table_bytes).ok_or_else(|| {
                malformed_error!("Table {} size overflows the stream", id)
            })?;
            if cursor > data.len() {
                return Err(malformed_error!(
                    "Table {} exceeds #~ stream - {} > {}",
                    id,
                    cursor,
                    data.len()
                ));
            }
        }

        Ok(TableDirectory {
            data,
            context,
            offsets,
        })
    }

    /// Number of rows in `table`.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.context.row_counts[table as usize]
    }

    /// True when `table` is present with at least one row.
    #[must_use]
    pub fn has_table(&self, table: TableId) -> bool {
        self.row_count(table) > 0
    }

    /// Positions a cursor at the start of row `rid` (1-based) of `table`.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowNotFound`] for a zero or out-of-range row
    /// index.
    pub fn row(&self, table: TableId, rid: u32) -> Result<RowCursor<'a, '_>> {
        if rid == 0 || rid > self.row_count(table) {
            return Err(crate::Error::RowNotFound(Token::from_parts(
                table as u8,
                rid,
            )));
        }

        let offset = self.offsets[table as usize]
            + self.context.row_size(table) * (rid as usize - 1);

        let mut parser = Parser::new(self.data);
        parser.seek(offset)?;

        Ok(RowCursor {
            parser,
            context: &self.context,
        })
    }
}

/// A cursor positioned at the start of one table row.
///
/// Column reads must be issued in declaration order; each read consumes the
/// column's module-specific width.
pub struct RowCursor<'a, 'd> {
    parser: Parser<'a>,
    context: &'d SizeContext,
}

impl RowCursor<'_, '_> {
    /// Reads a fixed one-byte column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn fixed_u8(&mut self) -> Result<u8> {
        self.parser.read_le::<u8>()
    }

    /// Reads a fixed two-byte column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn fixed_u16(&mut self) -> Result<u16> {
        self.parser.read_le::<u16>()
    }

    /// Reads a fixed four-byte column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn fixed_u32(&mut self) -> Result<u32> {
        self.parser.read_le::<u32>()
    }

    fn index(&mut self, width: usize) -> Result<u32> {
        if width == 4 {
            self.parser.read_le::<u32>()
        } else {
            Ok(u32::from(self.parser.read_le::<u16>()?))
        }
    }

    /// Reads a `#Strings` heap index column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn string_index(&mut self) -> Result<u32> {
        let width = self.context.heap.string;
        self.index(width)
    }

    /// Reads a `#Blob` heap index column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn blob_index(&mut self) -> Result<u32> {
        let width = self.context.heap.blob;
        self.index(width)
    }

    /// Reads a `#GUID` heap index column.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn guid_index(&mut self) -> Result<u32> {
        let width = self.context.heap.guid;
        self.index(width)
    }

    /// Reads a plain index column into `table` (a 1-based row id).
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn table_index(&mut self, table: TableId) -> Result<u32> {
        let width = self.context.table_index_width(table);
        self.index(width)
    }

    /// Reads and decodes a coded index column.
    ///
    /// A reserved tag decodes to the null token rather than failing; the
    /// caller's token-kind check reports it as unresolvable.
    ///
    /// # Errors
    /// Returns an error when the read crosses the stream end.
    pub fn coded_index(&mut self, kind: CodedIndexKind) -> Result<Token> {
        let width = self.context.coded_index_width(kind);
        let raw = self.index(width)?;
        Ok(kind.decode(raw).unwrap_or_else(|| Token::new(0)))
    }
}
