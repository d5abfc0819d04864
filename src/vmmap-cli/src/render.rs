//! Tabular output for map rows
//!
//! Five fixed-width columns; numeric columns render in hex.

use std::io::{self, Write};
use vmmap::OutputRow;

pub struct TableWriter<W> {
    out: W,
}

impl<W: Write> TableWriter<W> {
    pub fn new(out: W) -> Self {
        TableWriter { out }
    }

    pub fn header(&mut self) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>18} {:>18} {:>12} {:>12}  {}",
            "Virtual", "Mapped", "Size", "File Offset", "Output"
        )
    }

    pub fn row(&mut self, row: &OutputRow) -> io::Result<()> {
        writeln!(
            self.out,
            "{:>#18x} {:>#18x} {:>#12x} {:>#12x}  {}",
            row.virtual_offset, row.backing_offset, row.backing_size, row.file_offset, row.status
        )
    }
}
