use std::hash::{Hash, Hasher};

use thiserror::Error;

/// One brace-delimited argument of a marker occurrence. Offsets are byte
/// positions into the scanned source; `begin..end` spans the content
/// strictly inside the outer braces.
#[derive(Debug, Clone)]
pub struct Argument {
    pub content: String,
    pub begin: usize,
    pub end: usize,
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for Argument {}

impl Hash for Argument {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.hash(state);
    }
}

/// A marker occurrence. `end` is exclusive: one past the final unescaped
/// closing brace, or past the name for zero-arity markers. Equality and
/// hashing are by name and argument contents only, so occurrences of the
/// same call at different offsets deduplicate.
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    pub args: Vec<Argument>,
    pub begin: usize,
    pub end: usize,
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        for arg in &self.args {
            arg.hash(state);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not find end for tag argument starting at {offset} ({context})")]
pub struct ScanError {
    pub offset: usize,
    pub context: String,
}

fn scan_error(source: &str, offset: usize) -> ScanError {
    ScanError {
        offset,
        context: context_window(source, offset),
    }
}

/// A short window of source text around `offset`, for diagnostics.
fn context_window(source: &str, offset: usize) -> String {
    let before: String = source[..offset]
        .chars()
        .rev()
        .take(20)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let after: String = source[offset..].chars().take(20).collect();
    format!("{before} --> {after}")
}

/// Finds every occurrence of `name` in `source` and scans `arity` balanced
/// brace groups after each. A brace preceded by a backslash is literal, not
/// structural. The first group must open immediately after the name; later
/// groups may be separated by arbitrary text up to their opening brace.
pub fn find_tags(source: &str, name: &str, arity: usize) -> Result<Vec<Tag>, ScanError> {
    let bytes = source.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;
    while let Some(found) = source[pos..].find(name) {
        let begin = pos + found;
        let after_name = begin + name.len();
        pos = after_name;
        let mut cursor = after_name;
        let mut args = Vec::with_capacity(arity);
        for index in 0..arity {
            if index > 0 {
                cursor = find_structural_open(bytes, cursor)
                    .ok_or_else(|| scan_error(source, cursor))?;
            }
            if bytes.get(cursor) != Some(&b'{') {
                return Err(scan_error(source, cursor));
            }
            let close = find_matching_close(bytes, cursor)
                .ok_or_else(|| scan_error(source, cursor))?;
            args.push(Argument {
                content: source[cursor + 1..close].to_string(),
                begin: cursor + 1,
                end: close,
            });
            cursor = close + 1;
        }
        let end = if arity == 0 { after_name } else { cursor };
        tags.push(Tag {
            name: name.to_string(),
            args,
            begin,
            end,
        });
    }
    Ok(tags)
}

/// Byte index of the next unescaped opening brace at or after `from`.
fn find_structural_open(bytes: &[u8], from: usize) -> Option<usize> {
    let mut index = from;
    while index < bytes.len() {
        let escaped = index > 0 && bytes[index - 1] == b'\\';
        if bytes[index] == b'{' && !escaped {
            return Some(index);
        }
        index += 1;
    }
    None
}

/// Byte index of the closing brace matching the opener at `open`, tracking
/// nesting depth and skipping escaped braces.
fn find_matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut index = open;
    while index < bytes.len() {
        let escaped = index > 0 && bytes[index - 1] == b'\\';
        match bytes[index] {
            b'{' if !escaped => depth += 1,
            b'}' if !escaped => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            return Some(index);
        }
        index += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{find_tags, Tag};

    #[test]
    fn scans_single_argument() {
        let source = "pre \\gettext{Hello} post";
        let tags = find_tags(source, "\\gettext", 1).expect("scan");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].args[0].content, "Hello");
        assert_eq!(tags[0].begin, 4);
        assert_eq!(&source[tags[0].end..], " post");
    }

    #[test]
    fn escaped_braces_are_literal() {
        let source = "\\simple{a\\{b\\}c} tail";
        let tags = find_tags(source, "\\simple", 1).expect("scan");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].args[0].content, "a\\{b\\}c");
        assert_eq!(&source[tags[0].end..], " tail");
    }

    #[test]
    fn nested_braces_stay_inside_argument() {
        let tags = find_tags("\\gettext{a {b} c}", "\\gettext", 1).expect("scan");
        assert_eq!(tags[0].args[0].content, "a {b} c");
    }

    #[test]
    fn scans_multiple_arguments_with_gaps() {
        let tags = find_tags("\\pgettext{menu} {Open}", "\\pgettext", 2).expect("scan");
        assert_eq!(tags[0].args[0].content, "menu");
        assert_eq!(tags[0].args[1].content, "Open");
    }

    #[test]
    fn escaped_braces_between_arguments_are_skipped() {
        let tags =
            find_tags("\\pgettext{menu} \\{x\\} {Open}", "\\pgettext", 2).expect("scan");
        assert_eq!(tags[0].args[0].content, "menu");
        assert_eq!(tags[0].args[1].content, "Open");
    }

    #[test]
    fn no_structural_brace_for_a_later_argument_is_an_error() {
        assert!(find_tags("\\pgettext{menu} \\{x\\}", "\\pgettext", 2).is_err());
    }

    #[test]
    fn zero_arity_span_covers_name_only() {
        let source = "a \\today b \\today c";
        let tags = find_tags(source, "\\today", 0).expect("scan");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].end - tags[0].begin, "\\today".len());
        assert_eq!(&source[tags[0].end..tags[1].begin], " b ");
    }

    #[test]
    fn unterminated_argument_reports_offset_and_context() {
        let err = find_tags("xx \\gettext{never closed", "\\gettext", 1).unwrap_err();
        assert_eq!(err.offset, 11);
        assert!(err.context.contains("-->"));
        assert!(err.context.contains("never closed"));
    }

    #[test]
    fn missing_opening_brace_is_an_error() {
        assert!(find_tags("\\gettext no brace", "\\gettext", 1).is_err());
    }

    #[test]
    fn equality_ignores_offsets() {
        let tags = find_tags("\\gettext{Hi} and \\gettext{Hi}", "\\gettext", 1).expect("scan");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], tags[1]);
        let unique: HashSet<Tag> = tags.into_iter().collect();
        assert_eq!(unique.len(), 1);
    }
}
