//! Identifier naming for generated transform functions.

/// Words rendered fully uppercase in identifiers.
const COMMON_INITIALISMS: &[&str] = &[
    "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID", "IP",
    "JSON", "LHS", "OK", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XSRF", "XSS",
];

/// Splits `s` into words at non-alphanumeric characters and at every
/// lowercase letter followed by a non-lowercase character.
fn words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;
    let mut prev_lower = false;

    for (i, c) in s.char_indices() {
        if !c.is_alphanumeric() {
            if let Some(w) = start.take() {
                words.push(&s[w..i]);
            }
            prev_lower = false;
            continue;
        }
        match start {
            Some(w) if prev_lower && !c.is_lowercase() => {
                words.push(&s[w..i]);
                start = Some(i);
            }
            Some(_) => {}
            None => start = Some(i),
        }
        prev_lower = c.is_lowercase();
    }
    if let Some(w) = start {
        words.push(&s[w..]);
    }
    words
}

/// Converts `s` to an UpperCamelCase identifier.
///
/// Common initialisms are uppercased as a whole; other words get an
/// uppercase first letter and keep the rest as written.
///
/// # Examples
///
/// ```
/// use api_design_codegen::camel_case;
///
/// assert_eq!(camel_case("bottle_id"), "BottleID");
/// assert_eq!(camel_case("httpServer"), "HTTPServer");
/// assert_eq!(camel_case("media-type"), "MediaType");
/// ```
pub fn camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in words(s) {
        let upper = word.to_uppercase();
        if COMMON_INITIALISMS.contains(&upper.as_str()) {
            out.push_str(&upper);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Returns the name of the function converting `source` into `target`,
/// e.g. `BottleToBottleMediaV2`.
pub fn transform_name(source: &str, target: &str, suffix: &str) -> String {
    format!(
        "{}To{}{}",
        camel_case(source),
        camel_case(target),
        camel_case(suffix)
    )
}
