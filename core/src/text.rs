//! Fixed-width text shaping used for thread names and display columns

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

const ELLIPSIS_LEN: usize = ELLIPSIS.len();

/// Shape `text` to exactly `width` characters, or fewer when truncated.
///
/// Text longer than `width` is cut to `width - 3` characters, trailing
/// whitespace is trimmed from the cut, and `...` is appended. Shorter text
/// is right-padded with spaces. Widths are counted in `char`s.
///
/// When `width` is 3 or less there is no room for a head, so truncated text
/// collapses to the first `width` characters of the marker itself.
pub fn text_ellipsis(text: &str, width: usize) -> String {
    let len = text.chars().count();

    if len > width {
        if width <= ELLIPSIS_LEN {
            return ELLIPSIS[..width].to_string();
        }

        let head: String = text.chars().take(width - ELLIPSIS_LEN).collect();
        let mut shaped = head.trim_end().to_string();
        shaped.push_str(ELLIPSIS);
        return shaped;
    }

    let mut shaped = String::with_capacity(text.len() + (width - len));
    shaped.push_str(text);
    shaped.extend(std::iter::repeat(' ').take(width - len));
    shaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width_of(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_truncates_and_trims_before_marker() {
        assert_eq!(text_ellipsis("Hello World This Is Long", 20), "Hello World This...");
        assert_eq!(text_ellipsis("abcdefghijklmnopqrstuvwxyz", 20), "abcdefghijklmnopq...");
    }

    #[test]
    fn test_pads_short_text() {
        let shaped = text_ellipsis("Hi", 10);
        assert_eq!(shaped, "Hi        ");
        assert_eq!(width_of(&shaped), 10);
    }

    #[test]
    fn test_exact_width_is_unchanged() {
        assert_eq!(text_ellipsis("0123456789", 10), "0123456789");
    }

    #[test]
    fn test_padding_invariant() {
        for text in ["", "a", "quarterly report", "réunion d'équipe"] {
            for width in [17, 20, 40] {
                assert_eq!(width_of(&text_ellipsis(text, width)), width, "{text:?} @ {width}");
            }
        }
    }

    #[test]
    fn test_truncated_output_never_exceeds_width() {
        let long = "a fairly long line of text that will not fit";
        for width in 0..20 {
            assert!(width_of(&text_ellipsis(long, width)) <= width, "width {width}");
        }
    }

    #[test]
    fn test_idempotent_when_output_fills_width() {
        let inputs = ["Hello World This Is Long", "abcdefghijklmnopqrstuvwxyz", "short", ""];
        for text in inputs {
            let once = text_ellipsis(text, 20);
            if width_of(&once) == 20 {
                assert_eq!(text_ellipsis(&once, 20), once);
            }
        }
    }

    #[test]
    fn test_narrow_widths_clamp_to_marker() {
        assert_eq!(text_ellipsis("overflowing", 3), "...");
        assert_eq!(text_ellipsis("overflowing", 2), "..");
        assert_eq!(text_ellipsis("overflowing", 1), ".");
        assert_eq!(text_ellipsis("overflowing", 0), "");
        assert_eq!(text_ellipsis("ab", 3), "ab ");
        assert_eq!(text_ellipsis("", 0), "");
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(text_ellipsis("ééééé", 5), "ééééé");
        assert_eq!(text_ellipsis("éééééé", 5), "éé...");
    }
}
