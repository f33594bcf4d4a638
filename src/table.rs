//! Minimal elastic-width text table for CLI output.

use std::fmt::Write as _;

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ix, cell) in row.iter().enumerate().take(widths.len()) {
            widths[ix] = widths[ix].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    write_row(&mut output, headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat((*w).max(3))).collect();
    write_row(&mut output, &rule, &widths);
    for row in rows {
        write_row(&mut output, row, &widths);
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn write_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (ix, cell) in cells.iter().enumerate().take(widths.len()) {
        if ix > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        let padding = widths[ix].saturating_sub(cell.chars().count());
        for _ in 0..padding {
            line.push(' ');
        }
    }
    let _ = writeln!(output, "{}", line.trim_end());
}
