use std::io;
use std::path::{Path, PathBuf};

/// A target locale paired with the catalog file that backs it.
///
/// `exists` is false when the locale was requested explicitly but no
/// catalog file is present; the document is then passed through
/// unchanged for that locale.
#[derive(Debug, Clone)]
pub struct LocaleBinding {
    pub locale: String,
    pub po_path: PathBuf,
    pub exists: bool,
}

/// Resolves the set of translations to produce for `input`.
///
/// When `locales` is non-empty each entry maps to
/// `<dir>/<stem>.<locale>.po`, whether or not that file exists.
/// Otherwise `dir` is scanned for files named `*.<locale>.po` and one
/// binding is returned per discovered locale.
pub fn find_translations(
    input: &Path,
    dir: &Path,
    locales: &[String],
) -> Result<Vec<LocaleBinding>, io::Error> {
    if !locales.is_empty() {
        let stem = document_stem(input);
        return Ok(locales
            .iter()
            .map(|locale| {
                let po_path = dir.join(format!("{stem}.{locale}.po"));
                let exists = po_path.is_file();
                LocaleBinding {
                    locale: locale.clone(),
                    po_path,
                    exists,
                }
            })
            .collect());
    }

    let mut bindings = Vec::new();
    for entry in dir.read_dir()? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(locale) = catalog_locale(name) {
            bindings.push(LocaleBinding {
                locale: locale.to_string(),
                po_path: entry.path(),
                exists: true,
            });
        }
    }
    bindings.sort_by(|a, b| a.locale.cmp(&b.locale));
    Ok(bindings)
}

/// Extracts the locale tag from a `<stem>.<locale>.po` file name.
fn catalog_locale(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".po")?;
    let (_, locale) = stem.rsplit_once('.')?;
    if locale.is_empty() {
        return None;
    }
    Some(locale)
}

pub fn document_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{catalog_locale, find_translations};

    fn temp_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        path.push(format!("tex_gettext_{name}_{nanos}"));
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    #[test]
    fn parses_catalog_file_names() {
        assert_eq!(catalog_locale("paper.ru.po"), Some("ru"));
        assert_eq!(catalog_locale("paper.pt-BR.po"), Some("pt-BR"));
        assert_eq!(catalog_locale("paper.po"), None);
        assert_eq!(catalog_locale("paper.tex"), None);
        assert_eq!(catalog_locale("paper..po"), None);
    }

    #[test]
    fn discovers_catalogs_next_to_document() {
        let dir = temp_dir("discover");
        fs::write(dir.join("paper.tex"), "").expect("write");
        fs::write(dir.join("paper.ru.po"), "").expect("write");
        fs::write(dir.join("paper.de.po"), "").expect("write");
        fs::write(dir.join("notes.txt"), "").expect("write");

        let bindings =
            find_translations(&dir.join("paper.tex"), &dir, &[]).expect("bindings");
        let locales: Vec<&str> =
            bindings.iter().map(|binding| binding.locale.as_str()).collect();
        assert_eq!(locales, vec!["de", "ru"]);
        assert!(bindings.iter().all(|binding| binding.exists));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn explicit_locales_tolerate_missing_catalogs() {
        let dir = temp_dir("explicit");
        fs::write(dir.join("paper.ru.po"), "").expect("write");

        let locales = vec!["ru".to_string(), "fr".to_string()];
        let bindings =
            find_translations(&dir.join("paper.tex"), &dir, &locales).expect("bindings");
        assert_eq!(bindings.len(), 2);
        assert!(bindings[0].exists);
        assert_eq!(bindings[0].po_path, dir.join("paper.ru.po"));
        assert!(!bindings[1].exists);
        assert_eq!(bindings[1].locale, "fr");
        fs::remove_dir_all(&dir).ok();
    }
}
