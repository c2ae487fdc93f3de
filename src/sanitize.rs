/// Normalize a display name into a token usable as a path segment and an image tag.
///
/// Lowercases the input and deletes every character outside `[a-z0-9-]`.
pub fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_disallowed_characters() {
        assert_eq!(sanitize_name("Student #1"), "student1");
        assert_eq!(sanitize_name("Kim Min-Su"), "kimmin-su");
        assert_eq!(sanitize_name("a_b.c/d"), "abcd");
    }

    #[test]
    fn test_non_ascii_is_deleted() {
        assert_eq!(sanitize_name("김민수"), "");
        assert_eq!(sanitize_name("José 2"), "jos2");
    }

    #[test]
    fn test_output_alphabet() {
        let inputs = ["Hello, World!", "  --X--  ", "ÅÄÖ 123", "tab\tname\n"];
        for input in inputs {
            let out = sanitize_name(input);
            assert!(out
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            assert_eq!(out, sanitize_name(input));
        }
    }
}
