//! Include resolution, option-map threading, and date/expression
//! normalization for plain-text ledger sources (§4.9).
//!
//! This crate bridges [`ledger_parser`]'s syntax-level model to
//! [`ledger_core`]'s booking-ready [`ledger_core::Directive`] model:
//!
//! - `include` directives are resolved relative to the including file and
//!   recursed into, with cycle detection.
//! - A single mutable option-map is threaded across the whole directive
//!   stream (including across file boundaries); every directive is stamped
//!   with a frozen clone of the map as it stood when the directive was read.
//! - Every `DateSpec` is normalized to a UTC instant and every `AmountExpr`
//!   is evaluated to a `Decimal`.
//! - The final directive list is stably sorted by UTC instant.
//!
//! # Example
//!
//! ```no_run
//! use ledger_loader::Loader;
//! use std::path::Path;
//!
//! let ledger = Loader::new().load(Path::new("ledger.txt"))?;
//! println!("{} directives loaded", ledger.directives.len());
//! # Ok::<(), ledger_loader::LoadError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod normalize;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use ledger_core::{CurrencyMap, Directive, InternedStr, OptionDirective, OptionMap};
use ledger_parser::{ParseError, SyntaxDirective};
use thiserror::Error;

/// The default timezone used for times with no explicit offset.
const DEFAULT_TIMEZONE: &str = "UTC";
/// The option key overriding [`DEFAULT_TIMEZONE`].
const DEFAULT_TIMEZONE_OPTION: &str = "default-timezone";

/// Errors that can occur while loading a ledger.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// An `include` directive forms a cycle.
    #[error("include cycle detected: {}", .cycle.join(" -> "))]
    IncludeCycle {
        /// The files forming the cycle, in inclusion order.
        cycle: Vec<String>,
    },
    /// A file failed to parse.
    #[error("{path}: {} parse error(s)", .errors.len())]
    Parse {
        /// The file with parse errors.
        path: PathBuf,
        /// The parse errors encountered.
        errors: Vec<ParseError>,
    },
    /// A `DateSpec`'s timezone could not be resolved to a fixed offset.
    #[error("unresolvable timezone {timezone:?}: only UTC, Z, and +HH:MM/-HH:MM offsets are supported")]
    BadTimezone {
        /// The offending timezone string.
        timezone: String,
    },
}

/// The loaded, fully normalized ledger: a time-ordered directive stream plus
/// every currency declared along the way (§6).
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Every directive, stably sorted by UTC instant.
    pub directives: Vec<Directive>,
    /// Currencies declared via `currency`/`commodity` directives, mapped to
    /// whatever metadata was attached at the declaration site.
    pub currencies: CurrencyMap,
}

/// Loads a root ledger file and all of its transitive includes.
#[derive(Debug, Default)]
pub struct Loader {
    loaded_files: HashSet<PathBuf>,
    include_stack: Vec<PathBuf>,
}

impl Loader {
    /// Construct a loader with no files visited yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` and every file it (transitively) includes.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if any file cannot be read,
    /// [`LoadError::IncludeCycle`] if an `include` chain is circular,
    /// [`LoadError::Parse`] if any file fails to parse, or
    /// [`LoadError::BadTimezone`] if a directive's timezone cannot be
    /// resolved.
    pub fn load(&mut self, path: &Path) -> Result<Ledger, LoadError> {
        let mut directives = Vec::new();
        let mut currencies = CurrencyMap::new();
        let mut option_map = OptionMap::new();

        let canonical = canonicalize(path)?;
        self.load_recursive(&canonical, &mut option_map, &mut directives, &mut currencies)?;

        directives.sort_by_key(Directive::date);

        Ok(Ledger { directives, currencies })
    }

    fn load_recursive(
        &mut self,
        path: &Path,
        option_map: &mut OptionMap,
        directives: &mut Vec<Directive>,
        currencies: &mut CurrencyMap,
    ) -> Result<(), LoadError> {
        if self.include_stack.contains(&path.to_path_buf()) {
            let mut cycle: Vec<String> = self
                .include_stack
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            cycle.push(path.display().to_string());
            return Err(LoadError::IncludeCycle { cycle });
        }
        if !self.loaded_files.insert(path.to_path_buf()) {
            return Ok(());
        }

        let source = fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path.display().to_string();
        let (parsed, errors) = ledger_parser::parse(&file_name, &source);
        if !errors.is_empty() {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                errors,
            });
        }

        self.include_stack.push(path.to_path_buf());
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        for directive in &parsed {
            match directive {
                SyntaxDirective::Option { key, value, span } => {
                    option_map.insert(key.clone(), value.clone());
                    directives.push(Directive::Option(OptionDirective {
                        date: directives.last().map_or_else(
                            || chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).expect("epoch is representable"),
                            Directive::date,
                        ),
                        name: key.clone(),
                        value: value.clone(),
                        source: ledger_core::SourceContext::new(file_name.clone(), span.row),
                    }));
                }
                SyntaxDirective::Include { path: include_path, .. } => {
                    let full_path = base_dir.join(include_path);
                    let canonical = canonicalize(&full_path)?;
                    self.load_recursive(&canonical, option_map, directives, currencies)?;
                }
                SyntaxDirective::Currency { .. } => {
                    let lowered = normalize::lower(directive, &file_name, default_tz(option_map), option_map)?;
                    if let Directive::Currency(ref decl) = lowered {
                        currencies.insert(decl.currency.clone(), decl.meta.clone());
                    }
                    directives.push(lowered);
                }
                _ => {
                    let lowered = normalize::lower(directive, &file_name, default_tz(option_map), option_map)?;
                    directives.push(lowered);
                }
            }
        }

        self.include_stack.pop();
        Ok(())
    }
}

fn default_tz(option_map: &OptionMap) -> &str {
    option_map
        .get(DEFAULT_TIMEZONE_OPTION)
        .map_or(DEFAULT_TIMEZONE, String::as_str)
}

fn canonicalize(path: &Path) -> Result<PathBuf, LoadError> {
    path.canonicalize().map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load a single root file. Equivalent to `Loader::new().load(path)`.
///
/// # Errors
///
/// See [`Loader::load`].
pub fn load(path: &Path) -> Result<Ledger, LoadError> {
    Loader::new().load(path)
}
