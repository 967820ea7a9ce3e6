//! Alias engine. Rewrites a filename through a package's own alias
//! table, then through the project root's, honoring glob patterns and the
//! `false` → empty-shim convention.

use crate::classify::is_glob_pattern;
use crate::splitter::split_module_specifier;
use packagejson::{AliasMap, PackageJson, StringOrBool};
use path_clean::PathClean;
use path_slash::PathExt;
use regex::Regex;
use std::path::{Path, PathBuf};

/// The effect of a successful alias match, before it is flattened back
/// into the string form the rest of the resolver deals in.
enum AliasTarget {
    EmptyShim,
    Path(PathBuf),
    Specifier(String),
}

/// Looks up `filename` in a single alias table and, if found, classifies
/// the result. Returns `None` if the table has no usable entry for it.
///
/// If `filename` is absolute, the lookup key is its path relative to
/// `pkgdir` (prefixed with `./`); otherwise `filename` is used verbatim
/// first, falling back to a package-name-only lookup with the subpath
/// re-appended to a string match.
fn get_alias(filename: &str, pkgdir: &Path, table: &AliasMap) -> Option<AliasTarget> {
    let is_abs = Path::new(filename).is_absolute();
    let key = if is_abs {
        to_relative_key(filename, pkgdir)
    } else {
        filename.to_owned()
    };

    if let Some(value) = lookup(&key, table) {
        return Some(finalize(value, pkgdir));
    }

    if !is_abs {
        let (pkg, sub) = split_module_specifier(&key);
        if let Some(value) = table.get(pkg).and_then(usable) {
            if let Some(s) = value.as_str() {
                return Some(finalize(StringOrBool::Str(join_subpath(s, sub)), pkgdir));
            }
        }
    }

    None
}

/// Exact lookup first; on a miss, try each glob-shaped key in declaration
/// order, substituting captured groups into the matched replacement.
fn lookup(key: &str, table: &AliasMap) -> Option<StringOrBool> {
    if let Some(value) = table.get(key).and_then(usable) {
        return Some(value.clone());
    }

    for (pattern, value) in table {
        if !is_glob_pattern(pattern) {
            continue;
        }
        let Some(value) = usable(value) else { continue };
        let Some(re) = glob_to_regex(pattern) else { continue };
        let Some(captures) = re.captures(key) else { continue };
        return Some(match value {
            StringOrBool::Bool(b) => StringOrBool::Bool(*b),
            StringOrBool::Str(template) => {
                let mut expanded = String::new();
                captures.expand(template, &mut expanded);
                StringOrBool::Str(expanded)
            }
        });
    }
    None
}

/// `true` carries no defined meaning for an alias value; per the
/// convention of rejecting unrecognized shapes silently, it is treated as
/// if the entry were absent.
fn usable(value: &StringOrBool) -> Option<&StringOrBool> {
    match value {
        StringOrBool::Bool(true) => None,
        other => Some(other),
    }
}

fn finalize(value: StringOrBool, pkgdir: &Path) -> AliasTarget {
    match value {
        StringOrBool::Bool(_) => AliasTarget::EmptyShim,
        StringOrBool::Str(s) if s.starts_with('.') => AliasTarget::Path(pkgdir.join(&s).clean()),
        StringOrBool::Str(s) => AliasTarget::Specifier(s),
    }
}

fn to_relative_key(filename: &str, pkgdir: &Path) -> String {
    let path = Path::new(filename);
    let rel = path.strip_prefix(pkgdir).unwrap_or(path);
    let slashed = rel.to_slash().map(|s| s.into_owned()).unwrap_or_else(|| rel.display().to_string());
    if slashed.starts_with('.') {
        slashed
    } else {
        format!("./{slashed}")
    }
}

fn join_subpath(value: &str, sub: &str) -> String {
    if sub.is_empty() {
        value.to_owned()
    } else {
        format!("{}/{}", value.trim_end_matches('/'), sub)
    }
}

/// Compiles a glob-shaped alias key into an anchored regex with capture
/// groups: `*` becomes a capturing `.*`, `{a,b}` becomes a non-capturing
/// alternation, and an extglob `+(a|b)` becomes a capturing `(?:a|b)+`.
/// Everything else is escaped literally. Malformed patterns (unbalanced
/// braces/parens) are skipped by returning `None`.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push_str("(.*)");
                i += 1;
            }
            '+' if chars.get(i + 1) == Some(&'(') => {
                let close = find_closing(&chars, i + 1, '(', ')')?;
                let inner: String = chars[i + 2..close].iter().collect();
                let alts = alternation(&inner);
                out.push_str("((?:");
                out.push_str(&alts);
                out.push_str(")+)");
                i = close + 1;
            }
            '{' => {
                let close = find_closing(&chars, i, '{', '}')?;
                let inner: String = chars[i + 1..close].iter().collect();
                out.push_str("(?:");
                out.push_str(&alternation(&inner));
                out.push(')');
                i = close + 1;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    out.push('$');
    Regex::new(&out).ok()
}

fn alternation(inner: &str) -> String {
    inner
        .split(|c| c == ',' || c == '|')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// Finds the index of the `close` character matching the `open` at
/// `start`, assuming no nesting (sufficient for the glob shapes this
/// engine recognizes).
fn find_closing(chars: &[char], start: usize, open: char, close: char) -> Option<usize> {
    debug_assert_eq!(chars[start], open);
    chars[start + 1..]
        .iter()
        .position(|&c| c == close)
        .map(|p| start + 1 + p)
}

/// Applies a package's own alias table, then the project root's. Returns
/// `filename` unchanged if neither table fires.
pub fn resolve_aliases(
    filename: &str,
    pkg: Option<&PackageJson>,
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
) -> String {
    let after_package = resolve_package_aliases(filename, pkg, empty_shim);
    resolve_package_aliases(&after_package, root_pkg, empty_shim)
}

fn resolve_package_aliases(filename: &str, pkg: Option<&PackageJson>, empty_shim: &Path) -> String {
    let Some(pkg) = pkg else {
        return filename.to_owned();
    };
    let Some(table) = pkg.alias_table() else {
        return filename.to_owned();
    };
    match get_alias(filename, &pkg.pkgdir, table) {
        None => filename.to_owned(),
        Some(AliasTarget::EmptyShim) => empty_shim.to_slash_lossy().into_owned(),
        Some(AliasTarget::Path(p)) => p.to_slash_lossy().into_owned(),
        Some(AliasTarget::Specifier(s)) => s,
    }
}
