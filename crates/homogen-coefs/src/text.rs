//! Human-readable coefficient tables.
//!
//! ```text
//! volume: 1.000e+00
//!
//! \bar{A}:
//! 2.000e+00
//!
//! D:
//! 1.000e+00 5.000e-01
//! 5.000e-01 1.000e+00
//! ```
//!
//! One line per row along the last axis. Lossy: the float format decides
//! how many digits survive.

use std::path::Path;

use tracing::{debug, warn};

use homogen_core::{CoefValue, FloatFormat};

use crate::coefficients::Coefficients;
use crate::error::Result;

/// File extension of text coefficient tables.
pub const EXTENSION: &str = "txt";

/// Append one `label:` block to `out`.
pub fn write_entry(out: &mut String, label: &str, value: &CoefValue, format: &FloatFormat) {
    out.push('\n');
    out.push_str(label);
    out.push_str(":\n");
    for row in value.rows() {
        let cells: Vec<String> = row.iter().map(|&v| format.format(v)).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
}

/// Render the coefficient table, using tex names where available.
pub fn render(coefs: &Coefficients) -> String {
    let format = coefs.float_format();
    let mut out = format!("volume: {}\n", format.format(coefs.volume()));
    for (name, value) in coefs.iter() {
        write_entry(&mut out, coefs.label(name), value, format);
    }
    out
}

/// Render arbitrary named values (e.g. a full result store) without a
/// volume header.
pub fn render_entries<'a, I>(entries: I, format: &FloatFormat) -> String
where
    I: IntoIterator<Item = (&'a str, &'a CoefValue)>,
{
    let mut out = String::new();
    for (name, value) in entries {
        write_entry(&mut out, name, value, format);
    }
    out
}

/// Write the coefficient table to `path`.
///
/// Tex names that match no coefficient are logged and returned; they never
/// prevent the table from being written.
pub fn save_text(path: &Path, coefs: &Coefficients) -> Result<Vec<String>> {
    let unmatched = coefs.unmatched_tex_names();
    for name in &unmatched {
        warn!(tex_name = %name, "tex name does not match any coefficient");
    }
    std::fs::write(path, render(coefs))?;
    debug!(path = %path.display(), "saved coefficient table");
    Ok(unmatched)
}
