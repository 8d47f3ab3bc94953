use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{Catalog, CatalogError};
use crate::codegen::DEFAULT_PREFIX;
use crate::plural::{self, PluralError, DEFAULT_RULE};
use crate::scanner::{self, ScanError, Tag};

pub const TAG_GETTEXT: &str = "\\gettext";
pub const TAG_PGETTEXT: &str = "\\pgettext";
pub const TAG_NGETTEXT: &str = "\\ngettext";
pub const TAG_TODAY: &str = "\\today";
pub const TAG_FORMATDATE: &str = "\\formatdate";

/// Markers resolved through the catalog, with their arities.
pub const CATALOG_MARKERS: [(&str, usize); 3] = [
    (TAG_GETTEXT, 1),
    (TAG_PGETTEXT, 2),
    (TAG_NGETTEXT, 3),
];

/// Markers resolved through the date collaborator.
pub const DATE_MARKERS: [(&str, usize); 2] = [(TAG_TODAY, 0), (TAG_FORMATDATE, 3)];

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("plural: {0}")]
    Plural(#[from] PluralError),
    #[error("no translation for msgid {msgid:?} (context {context:?})")]
    MissingKey {
        msgid: String,
        context: Option<String>,
    },
    #[error("unknown tag: {0}")]
    UnknownTag(String),
    #[error("invalid date argument {0:?}")]
    InvalidDateArgument(String),
    #[error("date formatting: {0}")]
    Date(String),
}

/// Locale-aware date rendering is an external concern; the engine only
/// needs these two calls.
pub trait DateFormatter {
    fn today(&self) -> Result<String, TranslateError>;
    fn date(&self, day: u32, month: u32, year: i32) -> Result<String, TranslateError>;
}

/// Explicit catalog lifecycle: a bound catalog is parsed at most once, on
/// first use, and is immutable afterwards.
#[derive(Debug)]
enum CatalogState {
    Unbound,
    Unparsed(PathBuf),
    Parsed(Catalog),
}

/// A locale binding. Without a catalog (the source locale) every lookup is
/// the identity and plural markers fall back to [`DEFAULT_RULE`].
#[derive(Debug)]
pub struct Translation {
    pub locale: String,
    catalog: CatalogState,
    prefix: String,
}

impl Translation {
    /// The identity binding for the document's source locale.
    pub fn source(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            catalog: CatalogState::Unbound,
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Binds a catalog file, parsed lazily on first lookup.
    pub fn with_catalog_file(locale: &str, path: PathBuf) -> Self {
        Self {
            locale: locale.to_string(),
            catalog: CatalogState::Unparsed(path),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Binds an already-parsed catalog.
    pub fn with_catalog(locale: &str, catalog: Catalog) -> Self {
        Self {
            locale: locale.to_string(),
            catalog: CatalogState::Parsed(catalog),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Overrides the macro namespace prefix of generated code.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn is_bound(&self) -> bool {
        !matches!(self.catalog, CatalogState::Unbound)
    }

    fn ensure_parsed(&mut self) -> Result<(), TranslateError> {
        if let CatalogState::Unparsed(path) = &self.catalog {
            let parsed = Catalog::load(path)?;
            self.catalog = CatalogState::Parsed(parsed);
        }
        Ok(())
    }

    fn catalog(&self) -> Option<&Catalog> {
        match &self.catalog {
            CatalogState::Parsed(catalog) => Some(catalog),
            _ => None,
        }
    }

    /// Rewrites every marker occurrence in `source`, leaving all other text
    /// untouched.
    pub fn translate(
        &mut self,
        source: &str,
        dates: &dyn DateFormatter,
    ) -> Result<String, TranslateError> {
        let mut tags = collect_tags(source)?;
        tags.sort_by_key(|tag| tag.begin);
        let mut out = String::with_capacity(source.len());
        let mut prev = 0;
        for tag in &tags {
            // A marker inside an already-spliced argument is the outer
            // tag's text, not an occurrence of its own.
            if tag.begin < prev {
                continue;
            }
            out.push_str(&source[prev..tag.begin]);
            out.push_str(&self.resolve(tag, dates)?);
            prev = tag.end;
        }
        out.push_str(&source[prev..]);
        Ok(out)
    }

    fn resolve(&mut self, tag: &Tag, dates: &dyn DateFormatter) -> Result<String, TranslateError> {
        self.ensure_parsed()?;
        match (tag.name.as_str(), tag.args.as_slice()) {
            (TAG_GETTEXT, [text]) => match self.catalog() {
                None => Ok(text.content.clone()),
                Some(catalog) => lookup_msgstr(catalog, &text.content, None),
            },
            (TAG_PGETTEXT, [context, text]) => match self.catalog() {
                None => Ok(text.content.clone()),
                Some(catalog) => lookup_msgstr(catalog, &text.content, Some(&context.content)),
            },
            (TAG_NGETTEXT, [singular, plural_text, count]) => match self.catalog() {
                None => {
                    let variants = vec![singular.content.clone(), plural_text.content.clone()];
                    Ok(plural::select(
                        DEFAULT_RULE,
                        &count.content,
                        &variants,
                        &self.prefix,
                    )?)
                }
                Some(catalog) => {
                    let rule = catalog.plural_forms()?.to_string();
                    let entry = catalog.lookup(&singular.content, None).ok_or_else(|| {
                        TranslateError::MissingKey {
                            msgid: singular.content.clone(),
                            context: None,
                        }
                    })?;
                    Ok(plural::select(
                        &rule,
                        &count.content,
                        &entry.variants,
                        &self.prefix,
                    )?)
                }
            },
            (TAG_TODAY, []) => dates.today(),
            (TAG_FORMATDATE, [day, month, year]) => {
                let day = parse_date_component(&day.content)?;
                let month = parse_date_component(&month.content)?;
                let year = year
                    .content
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| TranslateError::InvalidDateArgument(year.content.clone()))?;
                dates.date(day, month, year)
            }
            _ => Err(TranslateError::UnknownTag(tag.name.clone())),
        }
    }
}

fn lookup_msgstr(
    catalog: &Catalog,
    msgid: &str,
    context: Option<&str>,
) -> Result<String, TranslateError> {
    let missing = || TranslateError::MissingKey {
        msgid: msgid.to_string(),
        context: context.map(str::to_string),
    };
    let entry = catalog.lookup(msgid, context).ok_or_else(missing)?;
    Ok(entry.msgstr().ok_or_else(missing)?.to_string())
}

fn parse_date_component(text: &str) -> Result<u32, TranslateError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| TranslateError::InvalidDateArgument(text.to_string()))
}

/// Every recognized marker occurrence in `source`, unsorted.
pub fn collect_tags(source: &str) -> Result<Vec<Tag>, ScanError> {
    let mut tags = Vec::new();
    for (name, arity) in CATALOG_MARKERS.iter().chain(DATE_MARKERS.iter()) {
        tags.extend(scanner::find_tags(source, name, *arity)?);
    }
    Ok(tags)
}

/// Only the markers that resolve through a catalog; extraction works on
/// these.
pub fn collect_catalog_tags(source: &str) -> Result<Vec<Tag>, ScanError> {
    let mut tags = Vec::new();
    for (name, arity) in CATALOG_MARKERS.iter() {
        tags.extend(scanner::find_tags(source, name, *arity)?);
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{DateFormatter, TranslateError, Translation};
    use crate::catalog::Catalog;
    use crate::scanner::Tag;

    struct FixedDates;

    impl DateFormatter for FixedDates {
        fn today(&self) -> Result<String, TranslateError> {
            Ok("1 January 2026".to_string())
        }

        fn date(&self, day: u32, month: u32, year: i32) -> Result<String, TranslateError> {
            Ok(format!("{day}.{month}.{year}"))
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("tex_gettext_{name}_{nanos}.po"));
        path
    }

    const RU_CATALOG: &str = r#"msgid ""
msgstr ""
"Language: ru\n"
"Plural-Forms: nplurals=2; plural=n != 1\n"

msgid "Hello"
msgstr "Privet"

msgctxt "menu"
msgid "Open"
msgstr "Otkryt"

msgid "one file"
msgid_plural "many files"
msgstr[0] "odin fajl"
msgstr[1] "mnogo fajlov"
"#;

    fn bound() -> Translation {
        let catalog = Catalog::parse(RU_CATALOG).expect("catalog");
        Translation::with_catalog("ru", catalog)
    }

    #[test]
    fn identity_translation_returns_arguments() {
        let mut translation = Translation::source("en");
        let out = translation
            .translate("A \\gettext{Hello} B \\pgettext{menu}{Open} C", &FixedDates)
            .expect("translate");
        assert_eq!(out, "A Hello B Open C");
    }

    #[test]
    fn identity_plural_uses_builtin_rule() {
        let mut translation = Translation::source("en");
        let out = translation
            .translate("\\ngettext{one file}{many files}{2}", &FixedDates)
            .expect("translate");
        assert_eq!(
            out,
            "\\setcounter{_gettext_n}{\\gettextmathnotequal{2}{1}}\
             \\ifthenelse{\\equal{\\value{_gettext_n}}{0}}{one file}{many files}"
        );
    }

    #[test]
    fn bound_translation_substitutes_catalog_text() {
        let mut translation = bound();
        let out = translation
            .translate("Say \\gettext{Hello}, then \\pgettext{menu}{Open}.", &FixedDates)
            .expect("translate");
        assert_eq!(out, "Say Privet, then Otkryt.");
    }

    #[test]
    fn bound_plural_reads_header_rule_and_variants() {
        let mut translation = bound();
        let out = translation
            .translate("\\ngettext{one file}{many files}{5}", &FixedDates)
            .expect("translate");
        assert_eq!(
            out,
            "\\setcounter{_gettext_n}{\\gettextmathnotequal{5}{1}}\
             \\ifthenelse{\\equal{\\value{_gettext_n}}{0}}{odin fajl}{mnogo fajlov}"
        );
    }

    #[test]
    fn missing_key_is_fatal() {
        let mut translation = bound();
        let err = translation
            .translate("\\gettext{Absent}", &FixedDates)
            .unwrap_err();
        assert!(matches!(err, TranslateError::MissingKey { .. }));
    }

    #[test]
    fn date_markers_delegate_to_formatter() {
        let mut translation = Translation::source("en");
        let out = translation
            .translate("\\today and \\formatdate{24}{12}{2025}", &FixedDates)
            .expect("translate");
        assert_eq!(out, "1 January 2026 and 24.12.2025");
    }

    #[test]
    fn invalid_date_argument_is_reported() {
        let mut translation = Translation::source("en");
        let err = translation
            .translate("\\formatdate{a}{12}{2025}", &FixedDates)
            .unwrap_err();
        assert!(matches!(err, TranslateError::InvalidDateArgument(_)));
    }

    #[test]
    fn unknown_tag_is_an_internal_error() {
        let mut translation = Translation::source("en");
        let tag = Tag {
            name: "\\mystery".to_string(),
            args: Vec::new(),
            begin: 0,
            end: 8,
        };
        let err = translation.resolve(&tag, &FixedDates).unwrap_err();
        assert!(matches!(err, TranslateError::UnknownTag(_)));
    }

    #[test]
    fn catalog_file_parses_once_on_first_lookup() {
        let path = temp_path("lazy");
        fs::write(&path, RU_CATALOG).expect("write catalog");
        let mut translation = Translation::with_catalog_file("ru", path.clone());
        let first = translation
            .translate("\\gettext{Hello}", &FixedDates)
            .expect("translate");
        assert_eq!(first, "Privet");
        // Parsed state survives; a second pass must not re-read the file.
        fs::remove_file(&path).expect("remove");
        let second = translation
            .translate("\\gettext{Hello}", &FixedDates)
            .expect("translate");
        assert_eq!(second, "Privet");
    }

    #[test]
    fn marker_inside_another_argument_belongs_to_the_outer_tag() {
        let mut translation = Translation::source("en");
        let out = translation
            .translate("\\gettext{see \\today}", &FixedDates)
            .expect("translate");
        assert_eq!(out, "see \\today");
    }

    #[test]
    fn non_marker_text_is_untouched() {
        let mut translation = bound();
        let source = "\\section{Intro}\n\\gettext{Hello} % comment\n";
        let out = translation.translate(source, &FixedDates).expect("translate");
        assert_eq!(out, "\\section{Intro}\nPrivet % comment\n");
    }
}
