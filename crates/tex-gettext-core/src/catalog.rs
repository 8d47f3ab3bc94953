use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

pub const FIELD_MSGID: &str = "msgid";
pub const FIELD_MSGID_PLURAL: &str = "msgid_plural";
pub const FIELD_MSGSTR: &str = "msgstr";
pub const FIELD_MSGCTXT: &str = "msgctxt";

/// Header field carrying the plural-rule description.
pub const HEADER_PLURAL_FORMS: &str = "Plural-Forms";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid po string: {0:?}")]
    InvalidString(String),
    #[error("continuation line without an open field: {0:?}")]
    DanglingContinuation(String),
    #[error("invalid msgstr index in field {0:?}")]
    InvalidIndex(String),
    #[error("conflicting translations for msgstr index {0}")]
    DuplicateVariant(usize),
    #[error("key already exists: msgid {msgid:?}, context {context:?}")]
    DuplicateKey {
        msgid: String,
        context: Option<String>,
    },
    #[error("missing required header field {0:?}")]
    MissingHeader(&'static str),
}

/// Lookup key within one catalog: msgid plus optional disambiguating
/// context.
pub type EntryKey = (String, Option<String>);

/// One catalog entry. `variants[0]` holds a plain `msgstr`; indexed
/// `msgstr[i]` fields fill the vector in numeric order for plural entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub context: Option<String>,
    pub variants: Vec<String>,
}

impl CatalogEntry {
    /// The singular translated string.
    pub fn msgstr(&self) -> Option<&str> {
        self.variants.first().map(String::as_str)
    }
}

/// A parsed PO catalog: header fields plus entries keyed by
/// (msgid, context). Immutable once parsed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub header: BTreeMap<String, String>,
    entries: BTreeMap<EntryKey, CatalogEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Line-oriented parse. Comment lines start with `#`; a field line is
    /// `<name> "<value>"`; quoted lines continue the preceding field. A
    /// `msgid` or `msgctxt` field line closes the entry under
    /// construction. The entry
    /// with the empty msgid becomes the header map, one `Key: value` pair
    /// per line of its msgstr.
    pub fn parse(text: &str) -> Result<Self, CatalogError> {
        let mut entries: BTreeMap<EntryKey, CatalogEntry> = BTreeMap::new();
        let mut fields: BTreeMap<String, String> = BTreeMap::new();
        let mut current_field: Option<String> = None;
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.starts_with('"') {
                let value = parse_po_string(trimmed)?;
                let field = current_field
                    .as_ref()
                    .ok_or_else(|| CatalogError::DanglingContinuation(trimmed.to_string()))?;
                if let Some(existing) = fields.get_mut(field) {
                    existing.push_str(&value);
                }
                continue;
            }
            let (name, rest) = match trimmed.split_once(' ') {
                Some(split) => split,
                None => (trimmed, ""),
            };
            // msgctxt precedes msgid, so either one opens a new entry.
            if (name == FIELD_MSGID || name == FIELD_MSGCTXT)
                && fields.contains_key(FIELD_MSGID)
            {
                close_entry(&mut fields, &mut entries)?;
            }
            let value = parse_po_string(rest.trim())?;
            fields.insert(name.to_string(), value);
            current_field = Some(name.to_string());
        }
        if fields.contains_key(FIELD_MSGID) {
            close_entry(&mut fields, &mut entries)?;
        }
        let mut header = BTreeMap::new();
        if let Some(pseudo) = entries.remove(&(String::new(), None)) {
            for line in pseudo.msgstr().unwrap_or("").lines() {
                if let Some((key, value)) = line.split_once(':') {
                    let key = key.trim();
                    if !key.is_empty() {
                        header.insert(key.to_string(), value.trim().to_string());
                    }
                }
            }
        }
        Ok(Self { header, entries })
    }

    pub fn lookup(&self, msgid: &str, context: Option<&str>) -> Option<&CatalogEntry> {
        let key = (msgid.to_string(), context.map(str::to_string));
        self.entries.get(&key)
    }

    pub fn plural_forms(&self) -> Result<&str, CatalogError> {
        self.header
            .get(HEADER_PLURAL_FORMS)
            .map(String::as_str)
            .ok_or(CatalogError::MissingHeader(HEADER_PLURAL_FORMS))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn close_entry(
    fields: &mut BTreeMap<String, String>,
    entries: &mut BTreeMap<EntryKey, CatalogEntry>,
) -> Result<(), CatalogError> {
    let raw = std::mem::take(fields);
    let mut msgid = None;
    let mut msgid_plural = None;
    let mut context = None;
    let mut variants: Vec<(usize, String)> = Vec::new();
    for (name, value) in raw {
        match name.as_str() {
            FIELD_MSGID => msgid = Some(value),
            FIELD_MSGID_PLURAL => msgid_plural = Some(value),
            FIELD_MSGCTXT => context = Some(value),
            FIELD_MSGSTR => variants.push((0, value)),
            _ => {
                if let Some(index) = name
                    .strip_prefix("msgstr[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    let index = index
                        .parse::<usize>()
                        .map_err(|_| CatalogError::InvalidIndex(name.clone()))?;
                    variants.push((index, value));
                }
                // Other field names are tolerated and dropped.
            }
        }
    }
    let msgid = match msgid {
        Some(msgid) => msgid,
        None => return Ok(()),
    };
    variants.sort_by_key(|(index, _)| *index);
    // A plain msgstr and msgstr[0] both claim index 0.
    for pair in variants.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(CatalogError::DuplicateVariant(pair[0].0));
        }
    }
    let entry = CatalogEntry {
        msgid: msgid.clone(),
        msgid_plural,
        context: context.clone(),
        variants: variants.into_iter().map(|(_, value)| value).collect(),
    };
    let key = (msgid, context);
    if entries.contains_key(&key) {
        return Err(CatalogError::DuplicateKey {
            msgid: key.0,
            context: key.1,
        });
    }
    entries.insert(key, entry);
    Ok(())
}

/// Unescapes one quoted PO string: the value must be wrapped in double
/// quotes, with backslash escapes for backslash, quote, and the usual
/// control characters.
fn parse_po_string(text: &str) -> Result<String, CatalogError> {
    let text = text.trim();
    if text.len() < 2 || !text.starts_with('"') || !text.ends_with('"') {
        return Err(CatalogError::InvalidString(text.to_string()));
    }
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => return Err(CatalogError::InvalidString(text.to_string())),
        }
    }
    Ok(out)
}
