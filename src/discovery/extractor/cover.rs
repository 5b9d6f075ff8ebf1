//! Generated placeholder covers for tracks without artwork.
//!
//! The placeholder is an inline SVG data URI: a rounded square in one of
//! seven colours with up to two initials from the title. Same title, same
//! cover, so lists don't reshuffle colours between refreshes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const PALETTE: &[&str] = &[
    "#3985ff", "#f97316", "#10b981", "#ef4444", "#8f5cf6", "#f59e42", "#34d399",
];

/// Colour for a title (by character count)
pub fn placeholder_color(title: &str) -> &'static str {
    PALETTE[title.chars().count() % PALETTE.len()]
}

/// Up to two uppercase initials; non-ASCII initials become `?`.
pub fn placeholder_initials(title: &str) -> String {
    let initials: String = title
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .map(|c| if c.is_ascii() { c.to_ascii_uppercase() } else { '?' })
        .take(2)
        .collect();

    if initials.is_empty() {
        "??".to_string()
    } else {
        initials
    }
}

/// SVG data URI placeholder for a title
pub fn placeholder_cover(title: &str) -> String {
    let svg = format!(
        concat!(
            r#"<svg width="48" height="48" viewBox="0 0 48 48" fill="none" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<rect width="48" height="48" rx="8" fill="{color}"/>"#,
            r#"<text x="24" y="30" text-anchor="middle" fill="white" font-family="Arial, sans-serif" font-size="16" font-weight="bold">{initials}</text>"#,
            "</svg>"
        ),
        color = placeholder_color(title),
        initials = xml_escape(&placeholder_initials(title)),
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(uri: &str) -> String {
        let payload = uri.strip_prefix("data:image/svg+xml;base64,").unwrap();
        String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_initials() {
        assert_eq!(placeholder_initials("ethereal waves of sound"), "EW");
        assert_eq!(placeholder_initials("Solo"), "S");
        assert_eq!(placeholder_initials("   "), "??");
        assert_eq!(placeholder_initials("Été Noir"), "?N");
    }

    #[test]
    fn test_color_is_deterministic() {
        assert_eq!(placeholder_color("abc"), placeholder_color("xyz"));
        assert_eq!(placeholder_color(""), "#3985ff");
        assert_eq!(placeholder_color("1234567"), "#3985ff");
        assert_eq!(placeholder_color("a"), "#f97316");
    }

    #[test]
    fn test_placeholder_cover_is_svg_data_uri() {
        let uri = placeholder_cover("Blockchain Symphony");
        assert!(uri.starts_with("data:image/svg+xml;base64,"));
        let svg = decode(&uri);
        assert!(svg.contains(">BS</text>"));
        assert!(svg.contains(placeholder_color("Blockchain Symphony")));
        assert_eq!(uri, placeholder_cover("Blockchain Symphony"));
    }

    #[test]
    fn test_markup_in_title_is_escaped() {
        let svg = decode(&placeholder_cover("<b> &c"));
        assert!(svg.contains("&lt;&amp;"));
    }
}
