use thiserror::Error;

use crate::codegen::{self, COUNT_IDENTIFIER};
use crate::expr::{self, ExprError, Parser};

/// Counter the selector assigns the compiled rule's value to before the
/// equality chain runs.
pub const COUNTER_NAME: &str = "_gettext_n";

/// Rule used when no catalog is bound: singular for exactly one, plural
/// otherwise.
pub const DEFAULT_RULE: &str = "nplurals=2; plural=n != 1";

#[derive(Debug, Error)]
pub enum PluralError {
    #[error("plural description must be formed as \"nplurals=<n>; plural=<rule>\": {0:?}")]
    MalformedDescription(String),
    #[error("plural rule expression: {0}")]
    Expr(#[from] ExprError),
    #[error("invalid number of variants (expected {expected}, but {found} found)")]
    ArityMismatch { expected: usize, found: usize },
}

/// A parsed `Plural-Forms` description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralRule {
    pub nplurals: usize,
    pub expression: String,
}

impl PluralRule {
    /// Splits a `nplurals=<int>; plural=<expr>` description. A trailing
    /// semicolon after the expression is tolerated, as emitted by common
    /// gettext tooling.
    pub fn parse(description: &str) -> Result<Self, PluralError> {
        let malformed = || PluralError::MalformedDescription(description.to_string());
        let mut fields = description.split(';');
        let nplurals = fields.next().ok_or_else(malformed)?.trim();
        let nplurals = nplurals
            .strip_prefix("nplurals")
            .ok_or_else(malformed)?
            .trim()
            .strip_prefix('=')
            .ok_or_else(malformed)?
            .trim();
        let nplurals = nplurals.parse::<usize>().map_err(|_| malformed())?;
        if nplurals == 0 {
            return Err(malformed());
        }
        let expression = fields.next().ok_or_else(malformed)?.trim();
        let expression = expression
            .strip_prefix("plural")
            .ok_or_else(malformed)?
            .trim()
            .strip_prefix('=')
            .ok_or_else(malformed)?
            .trim();
        if expression.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            nplurals,
            expression: expression.to_string(),
        })
    }

    /// Evaluates the rule for a concrete count. Used to validate rules and
    /// to test selection without a rendering engine.
    pub fn index_for(&self, count: u64) -> Result<usize, PluralError> {
        let mut parser = Parser::new(&self.expression);
        let count = count.to_string();
        parser.rename_identifier(COUNT_IDENTIFIER, &count);
        let value = expr::evaluate(&parser.parse()?)?;
        Ok(value.max(0) as usize)
    }
}

/// Compiles a plural description and variant list into a selector: assign
/// the rule's value to the counter, then chain equality-guarded
/// conditionals for indices `0..nplurals-1` with the final variant as the
/// unconditional fallback.
pub fn select(
    description: &str,
    count: &str,
    variants: &[String],
    prefix: &str,
) -> Result<String, PluralError> {
    let rule = PluralRule::parse(description)?;
    let compiled = codegen::compile(&rule.expression, prefix, &[(COUNT_IDENTIFIER, count)])?;
    if variants.len() != rule.nplurals {
        return Err(PluralError::ArityMismatch {
            expected: rule.nplurals,
            found: variants.len(),
        });
    }
    let mut out = format!("\\setcounter{{{COUNTER_NAME}}}{{{compiled}}}");
    let mut ending = String::new();
    let (last, guarded) = match variants.split_last() {
        Some(split) => split,
        None => {
            return Err(PluralError::ArityMismatch {
                expected: rule.nplurals,
                found: 0,
            })
        }
    };
    for (index, variant) in guarded.iter().enumerate() {
        out.push_str(&format!(
            "\\ifthenelse{{\\equal{{\\value{{{COUNTER_NAME}}}}}{{{index}}}}}{{{variant}}}{{"
        ));
        ending.push('}');
    }
    out.push_str(last);
    out.push_str(&ending);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{select, PluralError, PluralRule, DEFAULT_RULE};
    use crate::codegen::DEFAULT_PREFIX;

    fn variants(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn parses_default_rule() {
        let rule = PluralRule::parse(DEFAULT_RULE).expect("parse");
        assert_eq!(rule.nplurals, 2);
        assert_eq!(rule.expression, "n != 1");
    }

    #[test]
    fn tolerates_trailing_semicolon() {
        let rule = PluralRule::parse("nplurals=1; plural=0;").expect("parse");
        assert_eq!(rule.nplurals, 1);
        assert_eq!(rule.expression, "0");
    }

    #[test]
    fn rejects_malformed_descriptions() {
        for description in [
            "plural=n != 1",
            "nplurals=2",
            "nplurals=two; plural=0",
            "nplurals=2; rule=n != 1",
            "nplurals=0; plural=0",
        ] {
            assert!(matches!(
                PluralRule::parse(description),
                Err(PluralError::MalformedDescription(_))
            ));
        }
    }

    #[test]
    fn default_rule_selects_singular_for_one() {
        let rule = PluralRule::parse(DEFAULT_RULE).expect("parse");
        let names = variants(&["one", "many"]);
        assert_eq!(names[rule.index_for(1).expect("index")], "one");
        for count in [0, 2, 5] {
            assert_eq!(names[rule.index_for(count).expect("index")], "many");
        }
    }

    #[test]
    fn three_way_rule_selects_by_count() {
        let rule = PluralRule::parse(
            "nplurals=3; plural=(n%10==1 && n%100!=11) ? 0 : \
             (n%10>=2 && n%10<=4 && (n%100<10||n%100>=20)) ? 1 : 2",
        )
        .expect("parse");
        assert_eq!(rule.index_for(1).expect("index"), 0);
        assert_eq!(rule.index_for(22).expect("index"), 1);
        assert_eq!(rule.index_for(5).expect("index"), 2);
    }

    #[test]
    fn modulo_by_zero_surfaces_as_an_expression_error() {
        let rule = PluralRule::parse("nplurals=2; plural=n % 0").expect("parse");
        assert!(matches!(rule.index_for(5), Err(PluralError::Expr(_))));
    }

    #[test]
    fn selector_emits_counter_and_guard_chain() {
        let out = select(
            DEFAULT_RULE,
            "3",
            &variants(&["one", "many"]),
            DEFAULT_PREFIX,
        )
        .expect("select");
        assert_eq!(
            out,
            "\\setcounter{_gettext_n}{\\gettextmathnotequal{3}{1}}\
             \\ifthenelse{\\equal{\\value{_gettext_n}}{0}}{one}{many}"
        );
    }

    #[test]
    fn selector_chains_three_variants() {
        let out = select(
            "nplurals=3; plural=n",
            "2",
            &variants(&["a", "b", "c"]),
            DEFAULT_PREFIX,
        )
        .expect("select");
        assert_eq!(
            out,
            "\\setcounter{_gettext_n}{2}\
             \\ifthenelse{\\equal{\\value{_gettext_n}}{0}}{a}{\
             \\ifthenelse{\\equal{\\value{_gettext_n}}{1}}{b}{c}}"
        );
    }

    #[test]
    fn variant_count_must_match_nplurals() {
        let err = select(
            "nplurals=3; plural=n",
            "1",
            &variants(&["a", "b"]),
            DEFAULT_PREFIX,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PluralError::ArityMismatch {
                expected: 3,
                found: 2
            }
        ));
    }
}
