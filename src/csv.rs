// src/csv.rs
use std::io::{self, Write};
use std::mem::take;

/* ---------------- Parsing ---------------- */

/// Minimal delimited-text parser (quotes + CRLF tolerant).
///
/// Blank lines are dropped. A row that is only separators (`,,`) is kept:
/// its cells are real (empty) cells.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = s!();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut quoted = false; // current row had a quoted field, even an empty one
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next(); // doubled quote
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                    quoted = true;
                }
            }
            c if c == sep && !in_quotes => {
                row.push(take(&mut field));
            }
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) { chars.next(); }
                row.push(take(&mut field));
                flush_row(&mut rows, &mut row, quoted);
                quoted = false;
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline (or with unterminated quotes).
    row.push(field);
    flush_row(&mut rows, &mut row, quoted);

    rows
}

fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, quoted: bool) {
    let blank_line = row.len() == 1 && row[0].is_empty() && !quoted;
    if blank_line {
        row.clear();
    } else {
        rows.push(take(row));
    }
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single delimited row to any writer.
///
/// A row of exactly one empty cell is written as `""` so it does not read
/// back as a blank line.
pub fn write_row<W: Write>(mut w: W, row: &[String], sep: char) -> io::Result<()> {
    if row.len() == 1 && row[0].is_empty() {
        return writeln!(w, "\"\"");
    }
    let mut first = true;
    for cell in row {
        if !first { write!(w, "{}", sep)?; } else { first = false; }
        if needs_quotes(cell, sep) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Stringify rows as-is, the way `TableStore::save` lays them out.
pub fn rows_to_string<'a, I>(rows: I, sep: char) -> String
where
    I: IntoIterator<Item = &'a Vec<String>>,
{
    let mut buf: Vec<u8> = Vec::new();
    for r in rows {
        let _ = write_row(&mut buf, r, sep);
    }
    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}
