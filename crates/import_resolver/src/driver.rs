//! Resolution driver. Orchestrates the path classifier, alias engine,
//! `node_modules` walker, and file/directory loader behind the top-level
//! result cache, and raises `MODULE_NOT_FOUND` when nothing else matches.

use crate::alias::resolve_aliases;
use crate::classify::{classify, is_glob_pattern, ModuleKind};
use crate::error::ResolveError;
use crate::fs::FileSystem;
use crate::loader::{load_node_modules, load_relative};
use crate::manifest::ManifestCache;
use crate::node_modules::{locate, NodeModulesResult};
use crate::{candidates, Resolution};
use dashmap::DashMap;
use packagejson::BuiltinShimTable;
use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// Key into the result cache: `dirname(parent)` (or `""` for an
/// entrypoint-level call) paired with the raw request string.
type CacheKey = (String, String);

/// The bundler-flavored `node_modules` resolver.
///
/// One instance owns the result cache, the manifest cache, and the
/// filesystem collaborator for its entire lifetime; resolving the same
/// `(input, parent)` pair twice is guaranteed to return the same value.
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
    root_dir: PathBuf,
    extensions: Vec<String>,
    builtin_shims: BuiltinShimTable,
    empty_shim: PathBuf,
    manifests: ManifestCache,
    results: DashMap<CacheKey, Resolution>,
}

impl Resolver {
    /// `root_dir` anchors `/`-prefixed requests and is where the
    /// root-package alias table is loaded from; it must be absolute.
    /// `empty_shim` is the fixed path substituted for an `alias: false`
    /// match. `extensions` is the active extension set in priority order.
    pub fn new(
        root_dir: PathBuf,
        extensions: Vec<String>,
        empty_shim: PathBuf,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            fs,
            root_dir,
            extensions,
            builtin_shims: BuiltinShimTable::default(),
            empty_shim,
            manifests: ManifestCache::new(),
            results: DashMap::new(),
        }
    }

    pub fn with_builtin_shims(mut self, shims: BuiltinShimTable) -> Self {
        self.builtin_shims = shims;
        self
    }

    /// Resolves `input` as issued from `parent` (the absolute path of the
    /// file containing the request), or from the project root if `parent`
    /// is `None`.
    pub fn resolve(&self, input: &str, parent: Option<&Path>) -> Result<Resolution, ResolveError> {
        let parent_dir = parent.and_then(Path::parent);
        let key: CacheKey = (
            parent_dir
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default(),
            input.to_owned(),
        );

        if let Some(hit) = self.results.get(&key) {
            return Ok(hit.clone());
        }

        let dir = parent_dir.unwrap_or(&self.root_dir);

        // The glob short-circuit runs before alias resolution or
        // extension computation and is itself cached.
        if is_glob_pattern(input) {
            let resolution = Resolution::Glob {
                path: dir.join(input).clean(),
            };
            self.results.insert(key, resolution.clone());
            return Ok(resolution);
        }

        let exts = candidates::active_extensions(&self.extensions, parent);

        let owning_pkg = self.manifests.find_package(self.fs.as_ref(), dir);
        let root_pkg = self.manifests.read(self.fs.as_ref(), &self.root_dir);

        let aliased_input = resolve_aliases(
            input,
            owning_pkg.as_deref(),
            root_pkg.as_deref(),
            &self.empty_shim,
        );
        trace!(input, %aliased_input, "load-time alias pass");

        let resolution = match classify(&aliased_input, dir, &self.root_dir) {
            ModuleKind::Glob(pattern) => Some(Resolution::Glob {
                path: dir.join(&pattern).clean(),
            }),
            ModuleKind::Absolute(path) | ModuleKind::Tilde(path) | ModuleKind::Relative(path) => {
                load_relative(
                    self.fs.as_ref(),
                    &self.manifests,
                    &path,
                    &exts,
                    root_pkg.as_deref(),
                    &self.empty_shim,
                )
            }
            ModuleKind::Bare(name) => {
                match locate(self.fs.as_ref(), &name, dir, &self.builtin_shims) {
                    NodeModulesResult::BuiltinShim(path) => {
                        Some(Resolution::File { path, pkg: None })
                    }
                    NodeModulesResult::Match {
                        module_dir,
                        sub_path,
                        file_path,
                        ..
                    } => load_node_modules(
                        self.fs.as_ref(),
                        &self.manifests,
                        &module_dir,
                        &sub_path,
                        &file_path,
                        &exts,
                        root_pkg.as_deref(),
                        &self.empty_shim,
                    ),
                    NodeModulesResult::NotFound { .. } => None,
                }
            }
        };

        let resolution = resolution.ok_or_else(|| ResolveError::not_found(input, dir))?;
        self.results.insert(key, resolution.clone());
        Ok(resolution)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fs::OsFileSystem;
    use pretty_assertions::assert_eq;
    use test_tmpdir::test_tmpdir;
    use tracing_test::traced_test;

    fn resolver(tmp_root: PathBuf) -> Resolver {
        Resolver::new(
            tmp_root.clone(),
            vec![".js".to_owned(), ".json".to_owned()],
            tmp_root.join("_empty.js"),
            Arc::new(OsFileSystem),
        )
    }

    #[test]
    fn relative_with_parent_extension_priority() {
        let tmp = test_tmpdir! {
            "src/a.jsx" => "",
            "src/b.jsx" => "",
            "src/b.js" => ""
        };
        let r = Resolver::new(
            tmp.root().to_path_buf(),
            vec![".js".to_owned(), ".jsx".to_owned(), ".json".to_owned()],
            tmp.root_join("_empty.js"),
            Arc::new(OsFileSystem),
        );
        let res = r
            .resolve("./b", Some(&tmp.root_join("src/a.jsx")))
            .unwrap();
        assert_eq!(res, Resolution::File { path: tmp.root_join("src/b.jsx"), pkg: None });
    }

    #[test]
    fn root_absolute() {
        let tmp = test_tmpdir! {
            "src/a.js" => "",
            "lib/util.js" => ""
        };
        let r = resolver(tmp.root().to_path_buf());
        let res = r
            .resolve("/lib/util", Some(&tmp.root_join("src/a.js")))
            .unwrap();
        assert_eq!(res, Resolution::File { path: tmp.root_join("lib/util.js"), pkg: None });
    }

    #[test]
    fn tilde_anchors_to_package_boundary() {
        let tmp = test_tmpdir! {
            "node_modules/pkg/deep/inner.js" => "",
            "node_modules/pkg/styles.js" => ""
        };
        let r = resolver(tmp.root().to_path_buf());
        let res = r
            .resolve("~/styles", Some(&tmp.root_join("node_modules/pkg/deep/inner.js")))
            .unwrap();
        assert_eq!(
            res,
            Resolution::File { path: tmp.root_join("node_modules/pkg/styles.js"), pkg: None }
        );
    }

    #[test]
    #[traced_test]
    fn node_modules_walk_with_subpath_file() {
        let tmp = test_tmpdir! {
            "src/a.js" => "",
            "node_modules/lodash/package.json" => r#"{"name": "lodash"}"#,
            "node_modules/lodash/fp.js" => ""
        };
        let r = resolver(tmp.root().to_path_buf());
        let res = r
            .resolve("lodash/fp", Some(&tmp.root_join("src/a.js")))
            .unwrap();
        match res {
            Resolution::File { path, pkg } => {
                assert_eq!(path, tmp.root_join("node_modules/lodash/fp.js"));
                assert_eq!(pkg.unwrap().name.as_deref(), Some("lodash"));
            }
            _ => panic!("expected a file resolution"),
        }
    }

    #[test]
    fn browser_alias_false_maps_to_empty_shim() {
        let tmp = test_tmpdir! {
            "src/x.js" => "",
            "node_modules/p/package.json" =>
                r#"{"name": "p", "browser": {"./server.js": false}}"#,
            "node_modules/p/server.js" => "",
            "_empty.js" => ""
        };
        let r = resolver(tmp.root().to_path_buf());
        let res = r
            .resolve("p/server", Some(&tmp.root_join("src/x.js")))
            .unwrap();
        assert_eq!(res, Resolution::File { path: tmp.root_join("_empty.js"), pkg: None });
    }

    #[test]
    fn glob_pass_through_issues_no_stat() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingFileSystem {
            inner: OsFileSystem,
            stats: AtomicUsize,
        }
        impl FileSystem for CountingFileSystem {
            fn stat(&self, path: &Path) -> Option<crate::fs::Stat> {
                self.stats.fetch_add(1, Ordering::SeqCst);
                self.inner.stat(path)
            }
            fn read_file(&self, path: &Path) -> Option<String> {
                self.inner.read_file(path)
            }
            fn realpath(&self, path: &Path) -> Option<PathBuf> {
                self.inner.realpath(path)
            }
        }

        let tmp = test_tmpdir! { "src/index.js" => "" };
        let fs = Arc::new(CountingFileSystem {
            inner: OsFileSystem,
            stats: AtomicUsize::new(0),
        });
        let r = Resolver::new(
            tmp.root().to_path_buf(),
            vec![".js".to_owned(), ".json".to_owned()],
            tmp.root_join("_empty.js"),
            fs.clone(),
        );
        let res = r
            .resolve("./pages/*.md", Some(&tmp.root_join("src/index.js")))
            .unwrap();
        assert_eq!(res, Resolution::Glob { path: tmp.root_join("src/pages/*.md") });
        assert_eq!(fs.stats.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn not_found_raises_module_not_found() {
        let tmp = test_tmpdir! { "src/a.js" => "" };
        let r = resolver(tmp.root().to_path_buf());
        let err = r
            .resolve("nonexistent", Some(&tmp.root_join("src/a.js")))
            .unwrap_err();
        match err {
            ResolveError::ModuleNotFound { specifier, from } => {
                assert_eq!(specifier, "nonexistent");
                assert!(from.ends_with("src"));
            }
        }
    }

    #[test]
    fn repeated_resolution_hits_the_cache() {
        let tmp = test_tmpdir! { "src/b.js" => "" };
        let r = resolver(tmp.root().to_path_buf());
        let first = r.resolve("./b", Some(&tmp.root_join("src/a.js"))).unwrap();
        let second = r.resolve("./b", Some(&tmp.root_join("src/a.js"))).unwrap();
        assert_eq!(first, second);
    }
}
