//! printf-style float formats (`%8.3e`, `%.4f`, `%g`) for text output.
//!
//! Only a single floating point conversion is supported per format. Literal
//! text may surround it, with `%%` standing for a percent sign.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default format of the text coefficient table.
pub const DEFAULT_FLOAT_FORMAT: &str = "%8.3e";

/// Errors from parsing a float format string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("float format '{0}' has no conversion")]
    MissingConversion(String),

    #[error("float format '{spec}' uses unsupported conversion '{found}' (expected one of e, E, f, F, g, G)")]
    UnsupportedConversion { spec: String, found: char },

    #[error("float format '{0}' has more than one conversion")]
    MultipleConversions(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Exp,
    Fixed,
    General,
}

/// A parsed printf-style float format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FloatFormat {
    spec: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    plus_sign: bool,
    space_sign: bool,
    zero_pad: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
    uppercase: bool,
}

impl FloatFormat {
    pub fn parse(spec: &str) -> Result<Self, FormatError> {
        let chars: Vec<char> = spec.chars().collect();
        let mut prefix = String::new();
        let mut i = 0;

        // Literal text up to the conversion.
        loop {
            match chars.get(i) {
                None => return Err(FormatError::MissingConversion(spec.to_string())),
                Some('%') if chars.get(i + 1) == Some(&'%') => {
                    prefix.push('%');
                    i += 2;
                }
                Some('%') => {
                    i += 1;
                    break;
                }
                Some(&c) => {
                    prefix.push(c);
                    i += 1;
                }
            }
        }

        let mut format = FloatFormat {
            spec: spec.to_string(),
            prefix,
            suffix: String::new(),
            left_align: false,
            plus_sign: false,
            space_sign: false,
            zero_pad: false,
            alternate: false,
            width: 0,
            precision: None,
            conversion: Conversion::Exp,
            uppercase: false,
        };

        while let Some(&c) = chars.get(i) {
            match c {
                '-' => format.left_align = true,
                '+' => format.plus_sign = true,
                ' ' => format.space_sign = true,
                '0' => format.zero_pad = true,
                '#' => format.alternate = true,
                _ => break,
            }
            i += 1;
        }

        format.width = take_number(&chars, &mut i).unwrap_or(0);
        if chars.get(i) == Some(&'.') {
            i += 1;
            format.precision = Some(take_number(&chars, &mut i).unwrap_or(0));
        }

        let (conversion, uppercase) = match chars.get(i) {
            Some('e') => (Conversion::Exp, false),
            Some('E') => (Conversion::Exp, true),
            Some('f') => (Conversion::Fixed, false),
            Some('F') => (Conversion::Fixed, true),
            Some('g') => (Conversion::General, false),
            Some('G') => (Conversion::General, true),
            Some(&found) => {
                return Err(FormatError::UnsupportedConversion {
                    spec: spec.to_string(),
                    found,
                });
            }
            None => return Err(FormatError::MissingConversion(spec.to_string())),
        };
        format.conversion = conversion;
        format.uppercase = uppercase;
        i += 1;

        while let Some(&c) = chars.get(i) {
            if c == '%' {
                if chars.get(i + 1) != Some(&'%') {
                    return Err(FormatError::MultipleConversions(spec.to_string()));
                }
                i += 1;
            }
            format.suffix.push(c);
            i += 1;
        }

        Ok(format)
    }

    /// The format string this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.spec
    }

    pub fn format(&self, value: f64) -> String {
        let negative = value.is_sign_negative() && !value.is_nan();
        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        let body = self.body(value.abs());
        let len = sign.len() + body.len();
        let padded = if len >= self.width {
            format!("{sign}{body}")
        } else if self.left_align {
            format!("{sign}{body}{}", " ".repeat(self.width - len))
        } else if self.zero_pad && value.is_finite() {
            format!("{sign}{}{body}", "0".repeat(self.width - len))
        } else {
            format!("{}{sign}{body}", " ".repeat(self.width - len))
        };

        format!("{}{}{}", self.prefix, padded, self.suffix)
    }

    fn body(&self, magnitude: f64) -> String {
        if !magnitude.is_finite() {
            let text = if magnitude.is_nan() { "nan" } else { "inf" };
            return if self.uppercase {
                text.to_uppercase()
            } else {
                text.to_string()
            };
        }

        let precision = self.precision.unwrap_or(6);
        match self.conversion {
            Conversion::Fixed => {
                let mut out = format!("{:.*}", precision, magnitude);
                if self.alternate && precision == 0 {
                    out.push('.');
                }
                out
            }
            Conversion::Exp => exponential(magnitude, precision, self.uppercase, self.alternate),
            Conversion::General => {
                let significant = precision.max(1);
                let (_, exponent) = split_exponent(magnitude, significant - 1);
                let out = if exponent < -4 || exponent >= significant as i32 {
                    exponential(magnitude, significant - 1, self.uppercase, self.alternate)
                } else {
                    let decimals = (significant as i32 - 1 - exponent).max(0) as usize;
                    format!("{:.*}", decimals, magnitude)
                };
                if self.alternate {
                    out
                } else {
                    strip_trailing_zeros(&out)
                }
            }
        }
    }
}

impl Default for FloatFormat {
    fn default() -> Self {
        FloatFormat {
            spec: DEFAULT_FLOAT_FORMAT.to_string(),
            prefix: String::new(),
            suffix: String::new(),
            left_align: false,
            plus_sign: false,
            space_sign: false,
            zero_pad: false,
            alternate: false,
            width: 8,
            precision: Some(3),
            conversion: Conversion::Exp,
            uppercase: false,
        }
    }
}

impl FromStr for FloatFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FloatFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FloatFormat> for String {
    fn from(value: FloatFormat) -> Self {
        value.spec
    }
}

impl fmt::Display for FloatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

/// Render a number for console reports.
///
/// With a precision, values of ordinary magnitude are printed with that many
/// decimals and very small or very large ones in scientific notation. Without
/// one, Rust's shortest round-trip representation is used.
pub fn display_number(value: f64, precision: Option<usize>) -> String {
    let Some(precision) = precision else {
        return format!("{}", value);
    };
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-4..1e8).contains(&magnitude) {
        format!("{:.*}", precision, value)
    } else {
        format!("{:.*e}", precision, value)
    }
}

fn take_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while chars.get(*i).is_some_and(|c| c.is_ascii_digit()) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

/// Rust renders `1.5e3`; split that into mantissa and exponent.
fn split_exponent(magnitude: f64, decimals: usize) -> (String, i32) {
    let rendered = format!("{:.*e}", decimals, magnitude);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => (mantissa.to_string(), exponent.parse().unwrap_or(0)),
        None => (rendered, 0),
    }
}

/// C-style exponential notation with a signed, at least two-digit exponent.
fn exponential(magnitude: f64, decimals: usize, uppercase: bool, alternate: bool) -> String {
    let (mut mantissa, exponent) = split_exponent(magnitude, decimals);
    if alternate && decimals == 0 {
        mantissa.push('.');
    }
    let marker = if uppercase { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}{marker}{sign}{:02}", exponent.abs())
}

/// `%g` drops trailing zeros of the fraction, in the mantissa for the
/// exponential form.
fn strip_trailing_zeros(text: &str) -> String {
    let (number, exponent) = match text.find(['e', 'E']) {
        Some(pos) => text.split_at(pos),
        None => (text, ""),
    };
    if !number.contains('.') {
        return text.to_string();
    }
    let trimmed = number.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}{exponent}")
}
