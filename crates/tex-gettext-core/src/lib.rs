//! gettext-style translation of LaTeX sources.
//!
//! The pipeline: scan a document for translation markers
//! ([`scanner`]), resolve each against a per-locale PO catalog
//! ([`catalog`]), compile the catalog's plural rule to LaTeX arithmetic
//! macros ([`expr`], [`codegen`], [`plural`]), and splice the results back
//! into the source ([`translate`]). [`template`] emits the `.pot` skeleton
//! that catalog tooling starts from.

pub mod catalog;
pub mod codegen;
pub mod expr;
pub mod plural;
pub mod scanner;
pub mod template;
pub mod translate;

pub use catalog::{Catalog, CatalogEntry, CatalogError, EntryKey};
pub use codegen::DEFAULT_PREFIX;
pub use expr::{ExprError, Parser, Token};
pub use plural::{PluralError, PluralRule, DEFAULT_RULE};
pub use scanner::{Argument, ScanError, Tag};
pub use template::generate_template;
pub use translate::{DateFormatter, TranslateError, Translation};
