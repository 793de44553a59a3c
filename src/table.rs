use std::borrow::Cow;
use std::fmt::Write as _;

const ELLIPSIS: &str = "...";

/// Renders an aligned plain-text table. Cells longer than `max_cell`
/// characters are cut and suffixed with `...`.
pub fn render_table(headers: &[String], rows: &[Vec<String>], max_cell: Option<usize>) -> String {
    let headers = headers
        .iter()
        .map(|h| clip(h, max_cell))
        .collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| clip(cell, max_cell)).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&headers, &widths));
    let separator = widths
        .iter()
        .map(|w| Cow::Owned("-".repeat((*w).max(3))))
        .collect::<Vec<_>>();
    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn clip(value: &str, max_cell: Option<usize>) -> Cow<'_, str> {
    let flattened = if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    };
    match max_cell {
        Some(limit) if flattened.chars().count() > limit => {
            let mut cut = flattened.chars().take(limit).collect::<String>();
            cut.push_str(ELLIPSIS);
            Cow::Owned(cut)
        }
        _ => flattened,
    }
}

fn format_row(values: &[Cow<'_, str>], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let padding = width.saturating_sub(display_width(value));
            format!("{value}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

// Regional indicator pairs render as one glyph two columns wide, so each
// indicator counts as a single column.
fn display_width(value: &str) -> usize {
    value.chars().count()
}
