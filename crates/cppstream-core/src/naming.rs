//! Identifier conventions for generated headers.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `fooBar`, `foo_bar` | [`make_constant_name`] | `FOO_BAR` |
//! | `COLOR_RED`, `COLOR_` | [`strip_prefix`] | `RED` |
//! | `a/b.proto`, `/`, `_` | [`replace_char`] | `a_b.proto` |
//! | `a..b`, `.` | [`split`] | `["a", "b"]` |

/// Convert a schema identifier into an upper-case constant name.
///
/// Lower-case letters are upper-cased; an upper-case letter that directly
/// follows a lower-case one gets an underscore in front of it. Underscores
/// are kept and reset that boundary. Anything else is copied as is.
///
/// Distinct inputs can map to the same output (`fooBar` and `foo_bar`);
/// no attempt is made to detect that.
///
/// # Examples
///
/// ```
/// use cppstream_core::naming::make_constant_name;
///
/// assert_eq!(make_constant_name("fooBar"), "FOO_BAR");
/// assert_eq!(make_constant_name("foo_bar"), "FOO_BAR");
/// assert_eq!(make_constant_name("HTTPServer"), "HTTPSERVER");
/// ```
pub fn make_constant_name(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut underscore_next = false;

    for c in s.chars() {
        if c.is_ascii_uppercase() {
            if underscore_next {
                result.push('_');
                underscore_next = false;
            }
            result.push(c);
        } else if c.is_ascii_lowercase() {
            result.push(c.to_ascii_uppercase());
            underscore_next = true;
        } else {
            if c == '_' {
                underscore_next = false;
            }
            result.push(c);
        }
    }

    result
}

/// Remove `prefix` from the front of `s`, or return `s` unchanged.
///
/// # Examples
///
/// ```
/// use cppstream_core::naming::strip_prefix;
///
/// assert_eq!(strip_prefix("COLOR_RED", "COLOR_"), "RED");
/// assert_eq!(strip_prefix("RED", "COLOR_"), "RED");
/// ```
pub fn strip_prefix<'a>(s: &'a str, prefix: &str) -> &'a str {
    s.strip_prefix(prefix).unwrap_or(s)
}

/// Replace every occurrence of `from` with `to`.
pub fn replace_char(s: &str, from: char, to: char) -> String {
    s.chars().map(|c| if c == from { to } else { c }).collect()
}

/// Split on `delimiter`, dropping empty segments.
pub fn split(s: &str, delimiter: char) -> Vec<&str> {
    s.split(delimiter).filter(|part| !part.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_constant_name() {
        assert_eq!(make_constant_name("sides"), "SIDES");
        assert_eq!(make_constant_name("camelCaseName"), "CAMEL_CASE_NAME");
        assert_eq!(make_constant_name("snake_case_name"), "SNAKE_CASE_NAME");
        assert_eq!(make_constant_name("ALREADY_CONST"), "ALREADY_CONST");
        assert_eq!(make_constant_name("Color"), "COLOR");
        assert_eq!(make_constant_name("PowerState"), "POWER_STATE");
        assert_eq!(make_constant_name(""), "");
    }

    #[test]
    fn test_make_constant_name_digits_keep_boundary() {
        assert_eq!(make_constant_name("field_1"), "FIELD_1");
        assert_eq!(make_constant_name("v2Name"), "V2_NAME");
        assert_eq!(make_constant_name("ANDROID_a_b_proto_stream_h"), "ANDROID_A_B_PROTO_STREAM_H");
    }

    #[test]
    fn test_make_constant_name_collision_is_not_detected() {
        assert_eq!(make_constant_name("fooBar"), make_constant_name("foo_bar"));
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("STATE_ON", "STATE_"), "ON");
        assert_eq!(strip_prefix("STATE_", "STATE_"), "");
        assert_eq!(strip_prefix("OFF", "STATE_"), "OFF");
        assert_eq!(strip_prefix("state_on", "STATE_"), "state_on");
    }

    #[test]
    fn test_replace_char() {
        assert_eq!(replace_char("a/b/c.proto", '/', '_'), "a_b_c.proto");
        assert_eq!(replace_char("plain", '/', '_'), "plain");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("android.os", '.'), vec!["android", "os"]);
        assert_eq!(split("a..b.", '.'), vec!["a", "b"]);
        assert!(split("", '.').is_empty());
    }
}
