//! Escaping of sketch text embedded in an inline `<script>` element

const CLOSE_TAG: &[u8] = b"</script";

/// Neutralize every `</script` sequence so the sketch cannot end its script element
///
/// Matching is ASCII case-insensitive, since the HTML tokenizer is. The slash
/// becomes `\/`, which JavaScript string and template literals read back as a
/// plain `/`. The output never contains `</script` in any casing, so running
/// this on its own output changes nothing.
pub fn escape_script_text(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut copied = 0;
    let mut i = 0;

    while i + CLOSE_TAG.len() <= bytes.len() {
        if bytes[i..i + CLOSE_TAG.len()].eq_ignore_ascii_case(CLOSE_TAG) {
            // `<` and `/` are ASCII, so both slice points are char boundaries
            out.push_str(&code[copied..=i]);
            out.push_str("\\/");
            copied = i + 2;
            i += CLOSE_TAG.len();
        } else {
            i += 1;
        }
    }

    out.push_str(&code[copied..]);
    out
}

/// Whether `code` still contains a sequence that would close a script element
pub fn contains_script_close(code: &str) -> bool {
    code.as_bytes()
        .windows(CLOSE_TAG.len())
        .any(|w| w.eq_ignore_ascii_case(CLOSE_TAG))
}

/// Escape text for use inside a double-quoted HTML attribute
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
