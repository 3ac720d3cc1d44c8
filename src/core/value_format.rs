use serde::{Deserialize, Serialize};

/// Conversion applied to a value-axis label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueConversion {
    /// `%.Nf`; `%f` is six digits and `%.f` zero.
    Fixed { precision: u8 },
    /// `%d`: truncated toward zero.
    Integer,
    /// `%g`: six significant digits, trailing zeros trimmed.
    General,
}

/// printf-style value-axis label format with one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueFormat {
    prefix: String,
    conversion: ValueConversion,
    suffix: String,
}

impl Default for ValueFormat {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            conversion: ValueConversion::Fixed { precision: 0 },
            suffix: String::new(),
        }
    }
}

impl ValueFormat {
    /// Parses patterns such as `%.2f`, `%.f V`, `%d%%` or `x=%g`.
    ///
    /// Exactly one conversion is required; `%%` is a literal percent sign.
    #[must_use]
    pub fn parse(pattern: &str) -> Option<Self> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion = None;
        let mut chars = pattern.chars().peekable();

        while let Some(ch) = chars.next() {
            let target = if conversion.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if ch != '%' {
                target.push(ch);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                target.push('%');
                continue;
            }
            if conversion.is_some() {
                return None;
            }

            let mut precision: Option<u8> = None;
            if chars.peek() == Some(&'.') {
                chars.next();
                let mut digits = String::new();
                while let Some(digit) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(digit);
                    chars.next();
                }
                precision = Some(if digits.is_empty() {
                    0
                } else {
                    digits.parse().ok().filter(|p: &u8| *p <= 17)?
                });
            }

            conversion = Some(match (chars.next()?, precision) {
                ('f', precision) => ValueConversion::Fixed {
                    precision: precision.unwrap_or(6),
                },
                ('d', None) => ValueConversion::Integer,
                ('g', None) => ValueConversion::General,
                _ => return None,
            });
        }

        Some(Self {
            prefix,
            conversion: conversion?,
            suffix,
        })
    }

    #[must_use]
    pub fn conversion(&self) -> ValueConversion {
        self.conversion
    }

    #[must_use]
    pub fn format(&self, value: f64) -> String {
        let body = match self.conversion {
            ValueConversion::Fixed { precision } => {
                format!("{value:.prec$}", prec = usize::from(precision))
            }
            ValueConversion::Integer => format!("{}", value.trunc()),
            ValueConversion::General => format_general(value),
        };
        format!("{}{body}{}", self.prefix, self.suffix)
    }
}

fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_owned();
    }

    let exponent = value.abs().log10().floor() as i32;
    if !(-4..6).contains(&exponent) {
        let formatted = format!("{value:.5e}");
        let (mantissa, exp) = formatted.split_once('e').unwrap_or((&formatted, "0"));
        let mantissa = trim_fraction(mantissa);
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    let decimals = (5 - exponent).max(0) as usize;
    trim_fraction(&format!("{value:.decimals$}")).to_owned()
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
