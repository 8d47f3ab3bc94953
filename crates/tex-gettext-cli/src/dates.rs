use chrono::{Local, NaiveDate};

use tex_gettext_core::{DateFormatter, TranslateError};

const FORMAT: &str = "%-d %B %Y";

/// Locale-aware date rendering backed by chrono's localized formatter.
#[derive(Debug, Clone)]
pub struct ChronoDates {
    locale: chrono::Locale,
}

impl ChronoDates {
    pub fn new(tag: &str) -> Self {
        Self {
            locale: map_locale(tag),
        }
    }
}

impl DateFormatter for ChronoDates {
    fn today(&self) -> Result<String, TranslateError> {
        Ok(Local::now()
            .date_naive()
            .format_localized(FORMAT, self.locale)
            .to_string())
    }

    fn date(&self, day: u32, month: u32, year: i32) -> Result<String, TranslateError> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            TranslateError::Date(format!("no such calendar date: {day}.{month}.{year}"))
        })?;
        Ok(date.format_localized(FORMAT, self.locale).to_string())
    }
}

/// Maps a BCP 47-ish locale tag onto the nearest chrono locale,
/// falling back to `en_US` for tags chrono does not know.
fn map_locale(tag: &str) -> chrono::Locale {
    let normalized = tag.trim().replace('_', "-").to_ascii_lowercase();
    match normalized.as_str() {
        "cs" | "cs-cz" => chrono::Locale::cs_CZ,
        "de" | "de-de" => chrono::Locale::de_DE,
        "es" | "es-es" => chrono::Locale::es_ES,
        "fr" | "fr-fr" => chrono::Locale::fr_FR,
        "it" | "it-it" => chrono::Locale::it_IT,
        "ja" | "ja-jp" => chrono::Locale::ja_JP,
        "ko" | "ko-kr" => chrono::Locale::ko_KR,
        "nl" | "nl-nl" => chrono::Locale::nl_NL,
        "pl" | "pl-pl" => chrono::Locale::pl_PL,
        "pt" | "pt-pt" => chrono::Locale::pt_PT,
        "pt-br" => chrono::Locale::pt_BR,
        "ru" | "ru-ru" => chrono::Locale::ru_RU,
        "uk" | "uk-ua" => chrono::Locale::uk_UA,
        "zh" | "zh-cn" => chrono::Locale::zh_CN,
        "zh-tw" => chrono::Locale::zh_TW,
        _ => chrono::Locale::en_US,
    }
}

#[cfg(test)]
mod tests {
    use tex_gettext_core::{DateFormatter, TranslateError};

    use super::{map_locale, ChronoDates};

    #[test]
    fn unknown_tags_fall_back_to_english() {
        assert_eq!(map_locale("tlh"), chrono::Locale::en_US);
        assert_eq!(map_locale(""), chrono::Locale::en_US);
    }

    #[test]
    fn tags_normalize_before_lookup() {
        assert_eq!(map_locale("ru_RU"), chrono::Locale::ru_RU);
        assert_eq!(map_locale("pt-BR"), chrono::Locale::pt_BR);
    }

    #[test]
    fn formats_a_fixed_date() {
        let dates = ChronoDates::new("en");
        let rendered = dates.date(24, 12, 2025).expect("date");
        assert_eq!(rendered, "24 December 2025");
    }

    #[test]
    fn formats_in_the_requested_locale() {
        let dates = ChronoDates::new("de");
        let rendered = dates.date(1, 3, 2024).expect("date");
        assert_eq!(rendered, "1 März 2024");
    }

    #[test]
    fn rejects_impossible_dates() {
        let dates = ChronoDates::new("en");
        let err = dates.date(31, 2, 2024).expect_err("must fail");
        assert!(matches!(err, TranslateError::Date(_)));
    }

    #[test]
    fn today_renders_without_error() {
        let dates = ChronoDates::new("en");
        let rendered = dates.today().expect("today");
        assert!(!rendered.is_empty());
    }
}
