use regex::Regex;

fn numeric_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("valid regex"))
}

fn html_break_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"))
}

fn html_tag_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Extracts the first numeric value from free-form attribute text (`"2px"` -> `2.0`).
pub fn parse_numeric(text: &str) -> Option<f64> {
    let m = numeric_regex().find(text)?;
    m.as_str().parse::<f64>().ok()
}

/// Extracts every numeric value from a dash-pattern-like string.
pub fn parse_dash_pattern(text: &str) -> Option<Vec<f64>> {
    if text.is_empty() {
        return None;
    }
    let values: Vec<f64> = numeric_regex()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();
    if values.is_empty() { None } else { Some(values) }
}

/// Normalizes display text: strips surrounding quotes and wrapping parens, flattens
/// simple HTML markup, and collapses whitespace.
pub fn clean_label(text: &str) -> String {
    let mut value = text.trim().to_string();

    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = value[1..value.len() - 1].to_string();
    }

    // Some tools wrap labels in an extra pair of parentheses.
    if value.len() >= 2 && value.starts_with('(') && value.ends_with(')') {
        value = value[1..value.len() - 1].trim().to_string();
    }

    let value = html_break_regex().replace_all(&value, " ");
    let value = html_tag_regex().replace_all(&value, " ");

    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased identifier derived from arbitrary text; non-alphanumeric runs become `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_sep = true;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    let slug = slug.trim_matches('_').to_string();
    if slug.is_empty() { "group".to_string() } else { slug }
}

/// Splits source into trimmed-right lines, dropping a BOM and normalizing newlines.
pub fn normalize_lines(code: &str) -> Vec<String> {
    let text = code.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    text.split('\n').map(|l| l.trim_end().to_string()).collect()
}

/// Parses `translate(x, y)` offsets out of an SVG transform attribute.
pub fn parse_translate(transform: &str) -> (f64, f64) {
    fn translate_regex() -> &'static Regex {
        static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r"translate\(([^,\s]+)[,\s]+([^)]+)\)").expect("valid regex")
        })
    }
    let Some(caps) = translate_regex().captures(transform) else {
        return (0.0, 0.0);
    };
    let x = caps[1].parse::<f64>().unwrap_or(0.0);
    let y = caps[2].parse::<f64>().unwrap_or(0.0);
    (x, y)
}

/// Lenient float parse that falls back to the first embedded number.
pub fn to_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().or_else(|| parse_numeric(value))
}
