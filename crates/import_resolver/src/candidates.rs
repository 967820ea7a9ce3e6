//! Candidate enumerator. Produces the ordered list of file-on-disk
//! candidates for a base path, given the active extension list and the
//! aliases visible to the issuing package.

use crate::alias::resolve_aliases;
use packagejson::PackageJson;
use std::path::Path;

/// Computes the active extension list: the configured set, with the
/// parent file's own extension (if it's a member) moved to the front,
/// and an empty string prepended so the bare base path is tried as-is.
pub fn active_extensions(configured: &[String], parent: Option<&Path>) -> Vec<String> {
    let mut exts: Vec<String> = configured.to_vec();
    if let Some(parent) = parent {
        if let Some(ext) = parent.extension().and_then(|e| e.to_str()) {
            let dotted = format!(".{ext}");
            if let Some(pos) = exts.iter().position(|e| e == &dotted) {
                exts.remove(pos);
                exts.insert(0, dotted);
            }
        }
    }
    exts.insert(0, String::new());
    exts
}

/// For each extension, emits `file + ext` (or `file` unchanged when it
/// already ends with that extension, so an alias target resolved to a
/// full filename doesn't grow a second, spurious one). When
/// `expand_aliases` is set and aliasing `file + ext` produces something
/// different, the alias target's own candidate list (with alias
/// expansion turned off, to bound recursion) is emitted first.
pub fn expand_file(
    file: &str,
    exts: &[String],
    pkg: Option<&PackageJson>,
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
    expand_aliases: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    for ext in exts {
        let literal = if !ext.is_empty() && file.ends_with(ext.as_str()) {
            file.to_owned()
        } else {
            format!("{file}{ext}")
        };
        if expand_aliases {
            let aliased = resolve_aliases(&literal, pkg, root_pkg, empty_shim);
            if aliased != literal {
                out.extend(expand_file(
                    &aliased, exts, pkg, root_pkg, empty_shim, false,
                ));
            }
        }
        out.push(literal);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prepends_empty_string() {
        let exts = active_extensions(&[".js".to_owned()], None);
        assert_eq!(exts, vec!["".to_owned(), ".js".to_owned()]);
    }

    #[test]
    fn moves_parent_extension_to_front() {
        let configured = vec![".js".to_owned(), ".jsx".to_owned(), ".json".to_owned()];
        let parent = Path::new("/proj/src/a.jsx");
        let exts = active_extensions(&configured, Some(parent));
        assert_eq!(
            exts,
            vec![
                "".to_owned(),
                ".jsx".to_owned(),
                ".js".to_owned(),
                ".json".to_owned()
            ]
        );
    }

    #[test]
    fn leaves_order_unchanged_when_parent_extension_unconfigured() {
        let configured = vec![".js".to_owned(), ".json".to_owned()];
        let parent = Path::new("/proj/src/a.ts");
        let exts = active_extensions(&configured, Some(parent));
        assert_eq!(exts, vec!["".to_owned(), ".js".to_owned(), ".json".to_owned()]);
    }

    #[test]
    fn expand_file_without_aliases_is_literal_cross_product() {
        let exts = vec!["".to_owned(), ".js".to_owned()];
        let out = expand_file("/proj/src/b", &exts, None, None, Path::new("/proj/_empty.js"), true);
        assert_eq!(out, vec!["/proj/src/b".to_owned(), "/proj/src/b.js".to_owned()]);
    }

    #[test]
    fn expand_file_interleaves_alias_target_before_literal() {
        let pkg = {
            let mut pkg =
                PackageJson::parse(r#"{"alias": {"./b.js": "./shim.js"}}"#).unwrap();
            pkg.pkgdir = std::path::PathBuf::from("/proj/src");
            pkg
        };
        let exts = vec![".js".to_owned()];
        let out = expand_file(
            "/proj/src/b",
            &exts,
            Some(&pkg),
            None,
            Path::new("/proj/_empty.js"),
            true,
        );
        assert_eq!(
            out,
            vec!["/proj/src/shim.js".to_owned(), "/proj/src/b.js".to_owned()]
        );
    }
}

