//! Resolution of `@variant(registry:path|default)` directives embedded in
//! configuration strings and command line arguments.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::datatype::{is_quoted, read_boolean, read_integer, remove_quotes};
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::kernel::VariantLookup;
use crate::repository::parse_variant_path;
use crate::units::parse_value_with_unit;

lazy_static! {
    static ref VARIANT_DIRECTIVE: Regex = Regex::new(r"@variant\(([^)]*)\)").expect("valid directive regex");
}

const OPEN_TAG: &str = "@variant(";

fn parsing_failure(message: String) -> CommandError {
    CommandError::new(ErrorCode::ParsingFailure, message)
}

/// Splits `desc|default` on the first bar.
fn split_default(token: &str) -> (&str, Option<&str>) {
    match token.split_once('|') {
        Some((desc, default)) => (desc, Some(default)),
        None => (token, None),
    }
}

pub struct VariantPreprocessor<'a> {
    lookup: Option<&'a dyn VariantLookup>,
    remove_quotes: bool,
}

impl<'a> VariantPreprocessor<'a> {
    pub fn new(lookup: &'a dyn VariantLookup) -> Self {
        Self { lookup: Some(lookup), remove_quotes: false }
    }

    /// A preprocessor with nothing to look up: directives resolve to their
    /// defaults.
    pub fn detached() -> Self {
        Self { lookup: None, remove_quotes: false }
    }

    pub fn with_remove_quotes(mut self, remove_quotes: bool) -> Self {
        self.remove_quotes = remove_quotes;
        self
    }
    pub fn is_remove_quotes(&self) -> bool {
        self.remove_quotes
    }

    fn available_lookup(&self) -> Option<&'a dyn VariantLookup> {
        self.lookup.filter(|l| l.is_available())
    }

    /// Resolves `[!]registry:path[|default]` into the activity of the
    /// variant and whether the directive asks for its negation. The default
    /// is a boolean used when the variant cannot be looked up.
    pub fn resolve_variant(&self, desc: &str) -> CommandResult<(bool, bool)> {
        let (path_desc, default) = split_default(desc.trim());
        let default = match default {
            Some(text) => Some(read_boolean(text).ok_or_else(|| {
                parsing_failure(format!("Invalid default boolean value in variant directive '{}'", desc))
            })?),
            None => None,
        };
        let parsed = parse_variant_path(path_desc)
            .ok_or_else(|| parsing_failure(format!("Cannot parse variant path from '{}'", path_desc)))?;
        let Some(lookup) = self.available_lookup() else {
            return default.map(|d| (d, false)).ok_or_else(|| {
                CommandError::new(
                    ErrorCode::ParameterInvalidContext,
                    format!("No variant repository to resolve '{}'", desc),
                )
            });
        };
        match lookup.lookup_variant_activity(&parsed.registry, &parsed.path) {
            Ok(active) => {
                trace!(registry = %parsed.registry, path = %parsed.path, active, reversed = parsed.reversed, "variant resolved");
                Ok((active, parsed.reversed))
            }
            Err(e) => match default {
                Some(d) => {
                    debug!(directive = %desc, error = %e, "variant lookup failed, using default");
                    Ok((d, false))
                }
                None => Err(e),
            },
        }
    }

    /// Whether the directive `[!]registry:path[|default]` holds, negation
    /// applied.
    pub fn is_variant_enabled(&self, desc: &str) -> CommandResult<bool> {
        let (active, reversed) = self.resolve_variant(desc)?;
        Ok(active != reversed)
    }

    /// Textual value of the parameter named by `registry:path[|default]`.
    pub fn preprocess_parameter(&self, token: &str) -> CommandResult<String> {
        let (path_desc, default) = split_default(token.trim());
        let parsed = parse_variant_path(path_desc)
            .filter(|p| !p.reversed)
            .ok_or_else(|| parsing_failure(format!("Cannot parse variant parameter path from '{}'", token)))?;
        let resolved = match self.available_lookup() {
            None => default.map(str::to_owned).ok_or_else(|| {
                CommandError::new(
                    ErrorCode::ParameterInvalidContext,
                    format!("No variant repository to resolve '{}'", token),
                )
            })?,
            Some(lookup) => match lookup.lookup_parameter_value(&parsed.registry, &parsed.path) {
                Ok(value) => value,
                Err(e) => match default {
                    Some(d) => {
                        debug!(directive = %token, error = %e, "parameter lookup failed, using default");
                        d.to_owned()
                    }
                    None => return Err(e),
                },
            },
        };
        if self.remove_quotes && is_quoted(&resolved) {
            return Ok(remove_quotes(&resolved));
        }
        Ok(resolved)
    }

    /// Substitutes every `@variant(...)` directive of `source`.
    pub fn preprocess(&self, source: &str) -> CommandResult<String> {
        let mut out = String::with_capacity(source.len());
        let mut last = 0;
        for caps in VARIANT_DIRECTIVE.captures_iter(source) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&source[last..whole.start()]);
            out.push_str(&self.preprocess_parameter(&caps[1])?);
            last = whole.end();
        }
        let tail = &source[last..];
        if tail.contains(OPEN_TAG) {
            return Err(parsing_failure(format!("Cannot find variant close tag in '{}'", tail)));
        }
        out.push_str(tail);
        Ok(out)
    }

    pub fn preprocess_string(&self, source: &str) -> CommandResult<String> {
        self.preprocess(source).map(|s| remove_quotes(&s))
    }

    pub fn preprocess_boolean(&self, source: &str) -> CommandResult<bool> {
        let text = self.preprocess(source)?;
        read_boolean(&text).ok_or_else(|| parsing_failure(format!("Cannot read a boolean from '{}'", text)))
    }

    pub fn preprocess_integer(&self, source: &str) -> CommandResult<i32> {
        let text = self.preprocess(source)?;
        read_integer(&text).ok_or_else(|| parsing_failure(format!("Cannot read an integer from '{}'", text)))
    }

    /// Reads a real, converting a trailing unit symbol to internal units.
    pub fn preprocess_real(&self, source: &str) -> CommandResult<f64> {
        let text = self.preprocess(source)?;
        parse_value_with_unit(&text)
            .map(|q| q.value(1.0))
            .map_err(|e| parsing_failure(e.to_string()))
    }

    /// Preprocesses each argument, dropping the surrounding double quotes
    /// of the results.
    pub fn preprocess_args<S: AsRef<str>>(&self, args: &[S]) -> CommandResult<Vec<String>> {
        args.iter()
            .map(|arg| self.preprocess(arg.as_ref()).map(|t| remove_quotes(&t)))
            .collect()
    }
}
