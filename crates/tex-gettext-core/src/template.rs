use std::collections::HashSet;
use std::fmt::Write;

use crate::catalog::EntryKey;
use crate::scanner::ScanError;
use crate::translate::{collect_catalog_tags, TAG_GETTEXT, TAG_NGETTEXT, TAG_PGETTEXT};

/// Collects every catalog-resolved marker in `source`, deduplicates by
/// catalog key (msgid plus context, so repeated plural calls with varying
/// counts emit one block), and renders a `.pot` template ready for the
/// external catalog creation/merge tooling.
pub fn generate_template(source: &str) -> Result<String, ScanError> {
    let mut tags = collect_catalog_tags(source)?;
    tags.sort_by_key(|tag| tag.begin);
    let mut seen: HashSet<EntryKey> = HashSet::new();
    let mut out = String::new();
    out.push_str("msgid \"\"\n");
    out.push_str("msgstr \"\"\n");
    out.push_str("\"Last-Translator: FULL NAME <EMAIL@ADDRESS>\\n\"\n");
    out.push_str("\"Language: \\n\"\n");
    out.push_str("\"MIME-Version: 1.0\\n\"\n");
    out.push_str("\"Content-Type: text/plain; charset=UTF-8\\n\"\n");
    out.push_str("\"Content-Transfer-Encoding: 8bit\\n\"\n");
    out.push_str("\"Plural-Forms: nplurals=INTEGER; plural=EXPRESSION;\\n\"\n");
    out.push('\n');
    for tag in tags {
        let key: EntryKey = match tag.name.as_str() {
            TAG_PGETTEXT => (tag.args[1].content.clone(), Some(tag.args[0].content.clone())),
            _ => (tag.args[0].content.clone(), None),
        };
        if !seen.insert(key) {
            continue;
        }
        // write! to a String cannot fail.
        let _ = match tag.name.as_str() {
            TAG_GETTEXT => writeln!(
                out,
                "msgid \"{}\"\nmsgstr \"\"\n",
                escape(&tag.args[0].content)
            ),
            TAG_NGETTEXT => writeln!(
                out,
                "msgid \"{}\"\nmsgid_plural \"{}\"\nmsgstr[0] \"\"\nmsgstr[1] \"\"\n",
                escape(&tag.args[0].content),
                escape(&tag.args[1].content)
            ),
            TAG_PGETTEXT => writeln!(
                out,
                "msgctxt \"{}\"\nmsgid \"{}\"\nmsgstr \"\"\n",
                escape(&tag.args[0].content),
                escape(&tag.args[1].content)
            ),
            _ => Ok(()),
        };
    }
    Ok(out)
}

/// PO string escaping; inverse of the catalog parser's unescaping, so
/// extracted text survives a write/parse round trip.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}
