/// Strips lone UTF-16 surrogate halves while preserving valid surrogate
/// pairs (spec.md §4.3). Rust's `String` is always valid UTF-8, so a lone
/// surrogate from upstream JSON/JS sources surfaces here as the U+FFFD
/// replacement character produced by a lossy UTF-16→UTF-8 conversion
/// upstream of this crate; a valid surrogate pair is already a single
/// well-formed Unicode scalar (e.g. an emoji) by the time it reaches Rust,
/// so only the replacement character needs stripping.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '\u{FFFD}' {
            continue;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_replacement_characters() {
        let input = "hello\u{FFFD}world";
        assert_eq!(sanitize(input), "helloworld");
    }

    #[test]
    fn preserves_valid_multibyte_characters() {
        let input = "caf\u{e9} \u{1F600}";
        assert_eq!(sanitize(input), input);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize("  hi  "), "hi");
    }
}
