//! Columnar table rendering with buffered, batched output.
//!
//! All `print_*` calls append to an in-memory line buffer; `flush` is the
//! only operation that touches the output stream, as a single write.

use crate::{Result, WatchError};
use std::collections::HashMap;
use std::io::{self, Write};

/// One record to render: column key -> raw value. Built fresh per sample.
pub type Row = HashMap<String, u64>;

/// Cell formatting policy: raw value -> display text.
pub type Formatter = Box<dyn Fn(u64) -> String>;

/// Padding policy: display text + field width -> padded text.
///
/// Justifiers pad but never truncate, so an over-wide cell degrades to a
/// misaligned line rather than losing digits.
pub type Justifier = fn(&str, usize) -> String;

pub fn left(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

pub fn right(text: &str, width: usize) -> String {
    format!("{text:>width$}")
}

pub fn center(text: &str, width: usize) -> String {
    format!("{text:^width$}")
}

/// A single field of the table: lookup key, heading, print width, and the
/// formatting/justification policies applied to each cell.
pub struct Column {
    key: String,
    heading: String,
    width: usize,
    format: Formatter,
    justify: Option<Justifier>,
}

impl Column {
    fn justified(&self, text: &str) -> String {
        match self.justify {
            Some(justify) => justify(text, self.width),
            None => text.to_string(),
        }
    }

    /// Look the column's key up in `row`, format the raw value, then pad.
    /// A missing key is a caller bug and surfaces as an error.
    fn render(&self, row: &Row) -> Result<String> {
        let raw = row
            .get(&self.key)
            .ok_or_else(|| WatchError::UnknownColumn(self.key.clone()))?;
        Ok(self.justified(&(self.format)(*raw)))
    }

    fn render_heading(&self) -> String {
        self.justified(&self.heading)
    }
}

/// A heading spanning a run of adjacent columns. `width` holds only the
/// interior separator width not already owned by the spanned columns, so the
/// full printed span is `width` plus the spanned columns' widths.
pub struct ColumnGroup {
    heading: String,
    width: usize,
    start: usize,
    span: usize,
    justify: Justifier,
}

impl ColumnGroup {
    /// Justify the heading across the group's full printed span.
    fn render_heading(&self, full_width: usize) -> String {
        (self.justify)(&self.heading, full_width)
    }
}

/// Buffered columnar table writer.
pub struct Table {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    groups: Vec<ColumnGroup>,
    buf: Vec<String>,
    separator: String,
    divider: char,
}

impl Table {
    pub fn new() -> Self {
        Self::with_separator("  ", '-')
    }

    pub fn with_separator(separator: &str, divider: char) -> Self {
        Table {
            columns: Vec::new(),
            index: HashMap::new(),
            groups: Vec::new(),
            buf: Vec::new(),
            separator: separator.to_string(),
            divider,
        }
    }

    /// Append a column; declaration order is left-to-right display order.
    /// `format` defaults to plain decimal rendering of the raw value.
    pub fn add_column(
        &mut self,
        key: &str,
        heading: &str,
        width: usize,
        format: Option<Formatter>,
        justify: Option<Justifier>,
    ) {
        let format = format.unwrap_or_else(|| Box::new(|v: u64| v.to_string()));
        self.index.insert(key.to_string(), self.columns.len());
        self.columns.push(Column {
            key: key.to_string(),
            heading: heading.to_string(),
            width,
            format,
            justify,
        });
    }

    /// Wrap the most recently added `colspan` columns in a group heading.
    /// Groups must be declared after their columns and must not overlap.
    pub fn add_group(&mut self, heading: &str, colspan: usize, justify: Justifier) -> Result<()> {
        if colspan == 0 {
            return Err(WatchError::InvalidGroup("colspan must be at least 1".into()));
        }
        let start = self
            .columns
            .len()
            .checked_sub(colspan)
            .ok_or_else(|| WatchError::InvalidGroup(format!("colspan {colspan} exceeds declared columns")))?;
        let taken = self.groups.last().map(|g| g.start + g.span).unwrap_or(0);
        if start < taken {
            return Err(WatchError::InvalidGroup(format!("group '{heading}' overlaps a previous group")));
        }
        self.groups.push(ColumnGroup {
            heading: heading.to_string(),
            width: (colspan - 1) * self.separator.len(),
            start,
            span: colspan,
            justify,
        });
        Ok(())
    }

    /// Adjust a declared column's print width in place, e.g. to match
    /// observed data before the header is printed.
    pub fn set_column_width(&mut self, key: &str, width: usize) -> Result<()> {
        let i = *self
            .index
            .get(key)
            .ok_or_else(|| WatchError::UnknownColumn(key.to_string()))?;
        self.columns[i].width = width;
        Ok(())
    }

    /// Full printed span of a group: its own separator width plus the widths
    /// of the columns it covers.
    fn group_width(&self, group: &ColumnGroup) -> usize {
        let spanned: usize = self.columns[group.start..group.start + group.span]
            .iter()
            .map(|c| c.width)
            .sum();
        group.width + spanned
    }

    /// Buffer the heading lines: the group line (only if groups exist),
    /// then the column-heading line.
    pub fn print_header(&mut self) {
        if !self.groups.is_empty() {
            let mut segments = Vec::new();
            let mut groups = self.groups.iter().peekable();
            let mut i = 0;
            while i < self.columns.len() {
                if let Some(group) = groups.peek() {
                    if group.start == i {
                        let group = groups.next().unwrap();
                        segments.push(group.render_heading(self.group_width(group)));
                        i += group.span;
                        continue;
                    }
                }
                // Ungrouped column: blank padding keeps later groups aligned.
                segments.push(" ".repeat(self.columns[i].width));
                i += 1;
            }
            self.buf.push(segments.join(&self.separator));
        }
        let headings: Vec<String> = self.columns.iter().map(Column::render_heading).collect();
        self.buf.push(headings.join(&self.separator));
    }

    /// Buffer one data line for `row`.
    pub fn print_row(&mut self, row: &Row) -> Result<()> {
        let cells: Result<Vec<String>> = self.columns.iter().map(|c| c.render(row)).collect();
        self.buf.push(cells?.join(&self.separator));
        Ok(())
    }

    /// Buffer a rule line: each column filled with the divider character.
    pub fn print_divider(&mut self) {
        let segments: Vec<String> = self
            .columns
            .iter()
            .map(|c| self.divider.to_string().repeat(c.width))
            .collect();
        self.buf.push(segments.join(&self.separator));
    }

    /// Write the buffered lines to `out` as one contiguous write, optionally
    /// truncated to the first `max_lines` lines. The buffer is cleared even
    /// when the write fails.
    pub fn flush<W: Write>(&mut self, out: &mut W, max_lines: Option<usize>) -> io::Result<()> {
        let keep = match max_lines {
            Some(n) => n.min(self.buf.len()),
            None => self.buf.len(),
        };
        let mut text = self.buf[..keep].join("\n");
        if keep > 0 {
            text.push('\n');
        }
        self.buf.clear();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::{humanize, BINARY};

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.insert("dom".to_string(), 0);
        row.insert("active".to_string(), 1536);
        row.insert("free".to_string(), 2048);
        row
    }

    fn three_column_table() -> Table {
        let mut table = Table::new();
        table.add_column("dom", "DOM", 3, None, Some(right));
        table.add_column("active", "ACTIVE", 8, Some(Box::new(humanize(8, BINARY))), Some(right));
        table.add_column("free", "FREE", 8, Some(Box::new(humanize(8, BINARY))), Some(right));
        table
    }

    fn flushed(table: &mut Table) -> String {
        let mut out = Vec::new();
        table.flush(&mut out, None).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_justifiers() {
        assert_eq!(right("ab", 5), "   ab");
        assert_eq!(left("ab", 5), "ab   ");
        assert_eq!(center("ab", 6), "  ab  ");
        // Padding never truncates.
        assert_eq!(right("abcdef", 3), "abcdef");
    }

    #[test]
    fn test_row_fields_match_column_widths() {
        let mut table = three_column_table();
        table.print_header();
        table.print_row(&sample_row()).unwrap();
        let text = flushed(&mut table);

        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        for line in [header, row] {
            // Fields sit at fixed offsets: 3 + sep + 8 + sep + 8.
            assert_eq!(line.len(), 23);
            assert_eq!(&line[3..5], "  ");
            assert_eq!(&line[13..15], "  ");
        }
        assert_eq!(header, "DOM    ACTIVE      FREE");
        assert_eq!(row, "  0     1.50K        2K");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let mut table = three_column_table();
        let mut row = sample_row();
        row.remove("free");
        assert!(matches!(table.print_row(&row), Err(WatchError::UnknownColumn(k)) if k == "free"));
    }

    #[test]
    fn test_set_column_width() {
        let mut table = three_column_table();
        table.set_column_width("dom", 5).unwrap();
        table.print_header();
        let text = flushed(&mut table);
        assert!(text.starts_with("  DOM  "));

        assert!(matches!(
            table.set_column_width("nope", 4),
            Err(WatchError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_group_width_covers_interior_separators() {
        let mut table = three_column_table();
        table.add_group("queues", 2, center).unwrap();
        let group = &table.groups[0];
        // Two 8-wide columns joined by one 2-character separator.
        assert_eq!(table.group_width(group), 8 + 8 + 2);

        let mut single = Table::new();
        single.add_column("a", "A", 6, None, Some(right));
        single.add_group("only", 1, center).unwrap();
        assert_eq!(single.group_width(&single.groups[0]), 6);
    }

    #[test]
    fn test_group_heading_line_alignment() {
        let mut table = three_column_table();
        table.add_group("queues", 2, center).unwrap();
        table.print_header();
        table.print_row(&sample_row()).unwrap();
        let text = flushed(&mut table);

        let mut lines = text.lines();
        let group_line = lines.next().unwrap();
        let header = lines.next().unwrap();
        let row = lines.next().unwrap();
        // Blank padding over the ungrouped DOM column, then the centered
        // group heading across the full 18-character span.
        assert_eq!(group_line, "           queues      ");
        assert_eq!(group_line.len(), header.len());
        assert_eq!(header.len(), row.len());
    }

    #[test]
    fn test_invalid_group_declarations() {
        let mut table = three_column_table();
        assert!(matches!(table.add_group("x", 0, center), Err(WatchError::InvalidGroup(_))));
        assert!(matches!(table.add_group("x", 4, center), Err(WatchError::InvalidGroup(_))));
        table.add_group("tail", 2, center).unwrap();
        // A second group may not re-span already grouped columns.
        assert!(matches!(table.add_group("again", 3, center), Err(WatchError::InvalidGroup(_))));
    }

    #[test]
    fn test_divider_fills_each_column() {
        let mut table = three_column_table();
        table.print_divider();
        let text = flushed(&mut table);
        assert_eq!(text, "---  --------  --------\n");
    }

    #[test]
    fn test_flush_truncates_and_clears() {
        let mut table = three_column_table();
        table.print_divider();
        table.print_row(&sample_row()).unwrap();
        table.print_divider();

        let mut out = Vec::new();
        table.flush(&mut out, Some(2)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);

        // The buffer is empty afterwards regardless of truncation.
        let mut out = Vec::new();
        table.flush(&mut out, None).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_no_group_line_without_groups() {
        let mut table = three_column_table();
        table.print_header();
        let text = flushed(&mut table);
        assert_eq!(text.lines().count(), 1);
        assert_eq!(text, "DOM    ACTIVE      FREE\n");
    }
}
