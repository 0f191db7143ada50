use regex::Regex;
use std::sync::OnceLock;

/// Matches a `WxL` dimension such as `30x50`, `25*60` or `32,5 x 50`.
fn section_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+(?:[.,]\d+)?)\s*[xX*]\s*(\d+(?:[.,]\d+)?)")
            .expect("section pattern should compile")
    })
}

/// Parse a cross-section dimension out of a text annotation, returning
/// `(width, length)` in meters. The drawn values are centimeters; comma
/// decimal separators are accepted since exports from European CAD seats
/// use them.
pub fn extract_section(text: &str) -> Option<(f64, f64)> {
    let caps = section_pattern().captures(text)?;
    let a = parse_cm(caps.get(1)?.as_str())?;
    let b = parse_cm(caps.get(2)?.as_str())?;
    if a <= 0.0 || b <= 0.0 {
        return None;
    }
    Some((a / 100.0, b / 100.0))
}

fn parse_cm(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

/// Centimeter label for a cross-section, e.g. `30x50` for 0.30 m by 0.50 m.
pub fn section_label(width_m: f64, length_m: f64) -> String {
    format!(
        "{}x{}",
        (width_m * 100.0).round() as i64,
        (length_m * 100.0).round() as i64
    )
}
