//! Textual color codec for renderer `fill_color` values.
//!
//! Grammar (whitespace around tokens is ignored):
//!   rgba(R, G, B)      R, G, B integers 0–255
//!   rgba(R, G, B, A)   A decimal 0–1
//!   #rrggbb | #rgb     hex fallback, alpha 1
use std::fmt;
use std::str::FromStr;

use super::Rgba;
use crate::error::ColorParseError;

fn parse_channel(input: &str, token: &str) -> Result<u8, ColorParseError> {
    let token = token.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ColorParseError::new(input, "channel must be an integer"));
    }
    token
        .parse::<u16>()
        .ok()
        .filter(|v| *v <= 255)
        .map(|v| v as u8)
        .ok_or_else(|| ColorParseError::new(input, "channel out of range 0-255"))
}

fn parse_alpha(input: &str, token: &str) -> Result<f64, ColorParseError> {
    let a: f64 = token
        .trim()
        .parse()
        .map_err(|_| ColorParseError::new(input, "alpha must be a decimal"))?;
    if !(0.0..=1.0).contains(&a) {
        return Err(ColorParseError::new(input, "alpha out of range 0-1"));
    }
    Ok(a)
}

fn parse_hex(input: &str, hex: &str) -> Result<Rgba, ColorParseError> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorParseError::new(input, "invalid hex digit"));
    }
    let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| ColorParseError::new(input, "invalid hex digit"));
    match hex.len() {
        6 => Ok(Rgba::rgb(byte(&hex[0..2])?, byte(&hex[2..4])?, byte(&hex[4..6])?)),
        3 => {
            let short = |s: &str| byte(s).map(|v| v * 17);
            Ok(Rgba::rgb(short(&hex[0..1])?, short(&hex[1..2])?, short(&hex[2..3])?))
        }
        _ => Err(ColorParseError::new(input, "hex color must have 3 or 6 digits")),
    }
}

/// Parse a renderer color string.
pub fn parse_color(input: &str) -> Result<Rgba, ColorParseError> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(input, hex);
    }
    let inner = s
        .strip_prefix("rgba(")
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(|| ColorParseError::new(input, "expected rgba(...) or #hex"))?;

    let parts: Vec<&str> = inner.split(',').collect();
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::rgb(parse_channel(input, r)?, parse_channel(input, g)?, parse_channel(input, b)?)),
        [r, g, b, a] => Ok(Rgba {
            r: parse_channel(input, r)?,
            g: parse_channel(input, g)?,
            b: parse_channel(input, b)?,
            a: parse_alpha(input, a)?,
        }),
        _ => Err(ColorParseError::new(input, "expected 3 or 4 components")),
    }
}

/// Parse, substituting [`Rgba::NEUTRAL`] on failure.
pub fn parse_color_or_neutral(input: &str) -> Rgba {
    match parse_color(input) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(
                target: "context_grid::color",
                error = %err,
                "color.parse_failed; substituting neutral"
            );
            Rgba::NEUTRAL
        }
    }
}

/// Alpha with at most three decimals and no trailing zeros.
fn format_alpha(a: f64) -> String {
    let s = format!("{:.3}", a.clamp(0.0, 1.0));
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, format_alpha(self.a))
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_and_four_component_forms() {
        assert_eq!(parse_color("rgba(10, 20, 30)").unwrap(), Rgba::rgb(10, 20, 30));
        let c = parse_color("rgba(255,0,128,0.25)").unwrap();
        assert_eq!((c.r, c.g, c.b), (255, 0, 128));
        assert!((c.a - 0.25).abs() < 1e-12);
        assert!(parse_color("  rgba( 1 , 2 , 3 , 1 )  ").is_ok());
    }

    #[test]
    fn hex_fallback() {
        assert_eq!(parse_color("#ff8000").unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(parse_color("#0f0").unwrap(), Rgba::rgb(0, 255, 0));
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in [
            "",
            "red",
            "rgb(1, 2, 3)",
            "rgba(1, 2)",
            "rgba(1, 2, 3, 4, 5)",
            "rgba(256, 0, 0)",
            "rgba(-1, 0, 0)",
            "rgba(1.5, 0, 0)",
            "rgba(1, 2, 3, 1.5)",
            "rgba(1, 2, 3, x)",
            "rgba(1, 2, 3",
        ] {
            assert!(parse_color(bad).is_err(), "`{bad}` should not parse");
        }
    }

    #[test]
    fn neutral_substitution() {
        assert_eq!(parse_color_or_neutral("garbage"), Rgba::NEUTRAL);
        assert_eq!(parse_color_or_neutral("#000"), Rgba::rgb(0, 0, 0));
    }

    #[test]
    fn display_then_parse_is_stable() {
        for c in [Rgba::rgb(1, 2, 3), Rgba::rgb(250, 210, 60).with_alpha(0.85), Rgba::TRANSPARENT] {
            let text = c.to_string();
            let back: Rgba = text.parse().unwrap();
            assert_eq!((back.r, back.g, back.b), (c.r, c.g, c.b));
            assert!((back.a - c.a).abs() < 1e-3, "{text}");
        }
    }

    #[test]
    fn alpha_formatting() {
        assert_eq!(Rgba::rgb(0, 0, 0).to_string(), "rgba(0, 0, 0, 1)");
        assert_eq!(Rgba::TRANSPARENT.to_string(), "rgba(0, 0, 0, 0)");
        assert_eq!(Rgba::rgb(9, 9, 9).with_alpha(0.85).to_string(), "rgba(9, 9, 9, 0.85)");
    }
}
