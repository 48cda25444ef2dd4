//! JSON-Pointer style path encoding.
//!
//! A pointer is `""` for the root or a sequence of `/`-prefixed tokens. Inside
//! a token `~` is written `~0` and `/` is written `~1`, so every key survives
//! a round-trip exactly. Symbol keys encode as their description.

use std::borrow::Cow;

use strata_types::{PathSegment, Value};

use crate::error::{PatchError, PatchResult};

/// Escape one path token.
pub fn escape_segment(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Reverse [`escape_segment`]. Fails on a `~` not followed by `0` or `1`.
pub fn unescape_segment(token: &str) -> PatchResult<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            other => {
                return Err(PatchError::InvalidPointer {
                    pointer: token.to_string(),
                    reason: match other {
                        Some(c) => format!("invalid escape ~{c}"),
                        None => "dangling ~".to_string(),
                    },
                })
            }
        }
    }
    Ok(out)
}

/// Encode a path as a pointer string.
pub fn encode_pointer(path: &[PathSegment]) -> String {
    path.iter().fold(String::new(), |mut pointer, segment| {
        pointer.push('/');
        match segment {
            PathSegment::Index(i) => pointer.push_str(&i.to_string()),
            PathSegment::Key(key) => pointer.push_str(&escape_segment(key.as_str())),
        }
        pointer
    })
}

/// Decode a pointer into its unescaped tokens. `""` decodes to no tokens.
pub fn decode_pointer(pointer: &str) -> PatchResult<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(body) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer {
            pointer: pointer.to_string(),
            reason: "must be empty or start with '/'".to_string(),
        });
    };
    body.split('/').map(unescape_segment).collect()
}

/// Turn a decoded token into the segment `container` would be addressed by:
/// a numeric token on an array is an index, anything else is a key. The
/// append token `-` stays a key.
pub fn resolve_token(container: &Value, token: &str) -> PathSegment {
    match (container, token.parse::<usize>()) {
        (Value::Array(_), Ok(index)) if is_index_token(token) => PathSegment::Index(index),
        _ => PathSegment::from(token),
    }
}

/// Plain decimal without sign or leading zeros.
pub(crate) fn is_index_token(token: &str) -> bool {
    !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strata_types::{Key, Symbol};

    #[test]
    fn escapes_tilde_before_slash() {
        assert_eq!(escape_segment("plain"), "plain");
        assert_eq!(escape_segment("e/e"), "e~1e");
        assert_eq!(escape_segment("s~N"), "s~0N");
        assert_eq!(escape_segment("~1"), "~01");
        assert_eq!(unescape_segment("~01").unwrap(), "~1");
    }

    #[test]
    fn encodes_paths() {
        assert_eq!(encode_pointer(&[]), "");
        let path = vec!["a/b".into(), PathSegment::Index(0), "c".into()];
        assert_eq!(encode_pointer(&path), "/a~1b/0/c");
        assert_eq!(encode_pointer(&["".into()]), "/");

        let symbol = PathSegment::Key(Key::from(Symbol::new("tag")));
        assert_eq!(encode_pointer(&[symbol]), "/tag");
    }

    #[test]
    fn decodes_pointers() {
        assert!(decode_pointer("").unwrap().is_empty());
        assert_eq!(decode_pointer("/").unwrap(), vec![""]);
        assert_eq!(decode_pointer("/a~1b/0/s~0N").unwrap(), vec!["a/b", "0", "s~N"]);
    }

    #[test]
    fn rejects_malformed_pointers() {
        assert!(matches!(
            decode_pointer("a/b"),
            Err(PatchError::InvalidPointer { .. })
        ));
        assert!(decode_pointer("/a~2").is_err());
        assert!(decode_pointer("/a~").is_err());
    }

    #[test]
    fn tokens_resolve_by_container() {
        let array = Value::from(json!([1]));
        let object = Value::from(json!({"0": 1}));
        assert_eq!(resolve_token(&array, "0"), PathSegment::Index(0));
        assert_eq!(resolve_token(&array, "-"), PathSegment::from("-"));
        assert_eq!(resolve_token(&array, "01"), PathSegment::from("01"));
        assert_eq!(resolve_token(&object, "0"), PathSegment::from("0"));
    }
}
