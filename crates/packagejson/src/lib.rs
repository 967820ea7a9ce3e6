//! Subset of `package.json` consulted during module resolution.
//!
//! Only the fields a bundler resolver actually reads are modeled here:
//! `name`, `main`, `module`, `browser`, `source`, and `alias`. Everything
//! else in the manifest (scripts, dependencies, `exports`, ...) is parsed
//! and discarded by serde's default "unknown fields are ignored" behavior.

use ahashmap::AHashMap;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

/// Either a literal string value or the boolean `false`.
///
/// `false` is the convention package.json authors use in `browser` and
/// `alias` maps to mean "replace this module with an empty shim".
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum StringOrBool {
    Str(String),
    Bool(bool),
}

impl StringOrBool {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StringOrBool::Str(s) => Some(s),
            StringOrBool::Bool(_) => None,
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self, StringOrBool::Bool(false))
    }
}

/// An alias table: pattern (literal filename, bare module name, or glob)
/// to replacement. Declaration order is significant for glob matching, so
/// this is backed by an order-preserving map rather than a plain hashmap.
pub type AliasMap = IndexMap<String, StringOrBool>;

/// Shape shared by the `browser` and `source` fields: either a single
/// entry-point override (a string) or an alias table (an object). A field
/// of the "wrong" shape for a given purpose (an object where a string
/// entry point is wanted, or vice versa) is simply absent for that
/// purpose rather than an error.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Str(String),
    Table(AliasMap),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&AliasMap> {
        match self {
            FieldValue::Table(m) => Some(m),
            FieldValue::Str(_) => None,
        }
    }
}

/// Raw, parsed representation of a `package.json` file.
///
/// This is the shape serde deserializes directly. [`PackageJson::pkgfile`]
/// and [`PackageJson::pkgdir`] are not present in the file; they are filled
/// in by the caller immediately after parsing (see the resolver's manifest
/// cache), mirroring the two synthesized fields the bundler attaches to
/// every manifest it loads.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub browser: Option<FieldValue>,
    #[serde(default)]
    pub source: Option<FieldValue>,
    #[serde(default)]
    pub alias: Option<AliasMap>,

    #[serde(skip)]
    pub pkgfile: PathBuf,
    #[serde(skip)]
    pub pkgdir: PathBuf,
}

impl PackageJson {
    /// Parses the textual contents of a package.json file.
    ///
    /// `pkgfile`/`pkgdir` are left empty; the caller (the resolver's
    /// manifest cache) fills them in once the file's location is known.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Drops the `source` field. Called by the manifest cache once it has
    /// determined that `pkgfile` is not a symlink: `source` is only
    /// honored for locally-linked packages under active development.
    pub fn discard_source(&mut self) {
        self.source = None;
    }

    /// Resolves the package's entry point, following the field precedence
    /// `source` > `module` > `browser` (string form only) > `main`, and
    /// falling back to `index` when none apply.
    ///
    /// A `browser` map that re-exports the package under its own name
    /// (`{"<name>": "./other-entry.js"}`) takes priority over all of the
    /// above, per the convention some packages use to redirect a
    /// self-import.
    pub fn main_entry(&self) -> &str {
        // A package may re-export itself under its own name via `browser`;
        // when it does, that value takes the place of the plain `browser`
        // string in the precedence chain below (it does not jump the queue).
        let browser_as_str = self.browser.as_ref().and_then(|b| match b {
            FieldValue::Table(map) => {
                let name = self.name.as_deref()?;
                map.get(name).and_then(StringOrBool::as_str)
            }
            FieldValue::Str(s) => Some(s.as_str()),
        });

        let candidate = self
            .source
            .as_ref()
            .and_then(FieldValue::as_str)
            .or(self.module.as_deref())
            .or(browser_as_str)
            .or(self.main.as_deref());

        match candidate {
            None | Some("") | Some(".") | Some("./") => "index",
            Some(main) => main,
        }
    }

    /// The alias table consulted by the alias engine for this package, per
    /// the field precedence `source` > `alias` > `browser`: the first of
    /// the three whose value is an object wins. A `source`/`browser` field
    /// holding a plain string (an entry-point override, not a table) is
    /// skipped here, not an error.
    pub fn alias_table(&self) -> Option<&AliasMap> {
        self.source
            .as_ref()
            .and_then(FieldValue::as_table)
            .or(self.alias.as_ref())
            .or_else(|| self.browser.as_ref().and_then(FieldValue::as_table))
    }
}

/// Map type backing the builtin-shim table: bare module name to absolute
/// replacement path. Unordered since only exact lookups are performed.
pub type BuiltinShimTable = AHashMap<String, PathBuf>;

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_minimal_manifest() {
        let pkg = PackageJson::parse(r#"{"name": "lodash"}"#).unwrap();
        assert_eq!(pkg.name.as_deref(), Some("lodash"));
        assert_eq!(pkg.main_entry(), "index");
    }

    #[test]
    fn main_entry_precedence() {
        let pkg = PackageJson::parse(
            r#"{
                "name": "pkg",
                "main": "./main.js",
                "module": "./module.js",
                "source": "./source.js"
            }"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./source.js");
    }

    #[test]
    fn main_entry_falls_back_through_chain() {
        let pkg = PackageJson::parse(r#"{"main": "./main.js"}"#).unwrap();
        assert_eq!(pkg.main_entry(), "./main.js");

        let pkg = PackageJson::parse(r#"{}"#).unwrap();
        assert_eq!(pkg.main_entry(), "index");

        let pkg = PackageJson::parse(r#"{"main": "."}"#).unwrap();
        assert_eq!(pkg.main_entry(), "index");
    }

    #[test]
    fn source_as_alias_table_does_not_count_as_entry_point() {
        let pkg = PackageJson::parse(
            r#"{
                "main": "./main.js",
                "source": {"./foo.js": "./src/foo.js"}
            }"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./main.js");
        assert!(pkg.alias_table().is_some());
    }

    #[test]
    fn module_field_beats_browser_string() {
        let pkg = PackageJson::parse(
            r#"{
                "main": "./main.js",
                "module": "./module.js",
                "browser": "./browser.js"
            }"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./module.js");
    }

    #[test]
    fn browser_string_beats_main() {
        let pkg = PackageJson::parse(
            r#"{"main": "./main.js", "browser": "./browser.js"}"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./browser.js");
    }

    #[test]
    fn browser_map_does_not_override_main_unless_self_referential() {
        let pkg = PackageJson::parse(
            r#"{
                "name": "pkg",
                "main": "./main.js",
                "browser": {"./server.js": false}
            }"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./main.js");
    }

    #[test]
    fn browser_map_self_reference_wins() {
        let pkg = PackageJson::parse(
            r#"{
                "name": "pkg",
                "main": "./main.js",
                "browser": {"pkg": "./browser-entry.js"}
            }"#,
        )
        .unwrap();
        assert_eq!(pkg.main_entry(), "./browser-entry.js");
    }

    #[test]
    fn alias_map_preserves_declaration_order() {
        let pkg = PackageJson::parse(
            r#"{
                "alias": {"z-pattern": "./z.js", "a-pattern": "./a.js", "*.css": false}
            }"#,
        )
        .unwrap();
        let alias = pkg.alias.unwrap();
        let keys: Vec<&str> = alias.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z-pattern", "a-pattern", "*.css"]);
    }

    #[test]
    fn alias_table_precedence_source_then_alias_then_browser() {
        let pkg = PackageJson::parse(
            r#"{
                "alias": {"a": "./a.js"},
                "browser": {"b": "./b.js"}
            }"#,
        )
        .unwrap();
        let table = pkg.alias_table().unwrap();
        assert!(table.contains_key("a"));
        assert!(!table.contains_key("b"));
    }

    #[test]
    fn discard_source_clears_field() {
        let mut pkg = PackageJson::parse(r#"{"source": "./src/index.js"}"#).unwrap();
        assert!(pkg.source.is_some());
        pkg.discard_source();
        assert!(pkg.source.is_none());
    }
}
