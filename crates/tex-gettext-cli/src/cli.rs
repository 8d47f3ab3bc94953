use std::path::PathBuf;

use thiserror::Error;

use crate::command_extract::{run_extract, ExtractCommandError, ExtractOptions};
use crate::command_translate::{run_translate, TranslateCommandError, TranslateOptions};

#[derive(Debug, Error)]
pub enum CliAppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Translate(#[from] TranslateCommandError),
    #[error(transparent)]
    Extract(#[from] ExtractCommandError),
}

pub fn run() -> Result<(), CliAppError> {
    let mut args = std::env::args().skip(1);
    let command = args
        .next()
        .ok_or_else(|| CliAppError::Usage(usage()))?;
    match command.as_str() {
        "translate" => {
            let options = parse_translate_options(args.collect())?;
            run_translate(&options)?;
            Ok(())
        }
        "extract" => {
            let options = parse_extract_options(args.collect())?;
            run_extract(&options)?;
            Ok(())
        }
        _ => Err(CliAppError::Usage(usage())),
    }
}

fn parse_translate_options(args: Vec<String>) -> Result<TranslateOptions, CliAppError> {
    let mut input = None;
    let mut locales = Vec::new();
    let mut po_dir = None;
    let mut config_path = PathBuf::from("tex-gettext.toml");
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--input" => input = Some(PathBuf::from(next_value("--input", &mut iter)?)),
            "--locale" => locales.push(next_value("--locale", &mut iter)?),
            "--po-dir" => po_dir = Some(PathBuf::from(next_value("--po-dir", &mut iter)?)),
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            "--help" | "-h" => return Err(CliAppError::Usage(usage())),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }

    let input = input.ok_or_else(|| CliAppError::Usage(usage()))?;

    Ok(TranslateOptions {
        input,
        locales,
        po_dir,
        config_path,
    })
}

fn parse_extract_options(args: Vec<String>) -> Result<ExtractOptions, CliAppError> {
    let mut input = None;
    let mut output = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--input" => input = Some(PathBuf::from(next_value("--input", &mut iter)?)),
            "--out" => output = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--help" | "-h" => return Err(CliAppError::Usage(usage())),
            _ => return Err(CliAppError::Usage(usage())),
        }
    }

    let input = input.ok_or_else(|| CliAppError::Usage(usage()))?;

    Ok(ExtractOptions { input, output })
}

fn next_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String, CliAppError> {
    iter.next()
        .ok_or_else(|| CliAppError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn usage() -> String {
    "usage: tex-gettext translate --input <tex> [--locale <tag>...] [--po-dir <dir>] [--config <path>]\n       tex-gettext extract --input <tex> [--out <path>]".to_string()
}
