//! File/directory loader. Probes a base path as a file first; if
//! nothing matches, retries it as a directory via the manifest's entry
//! point (falling back to `index`).

use crate::candidates::expand_file;
use crate::fs::FileSystem;
use crate::manifest::ManifestCache;
use crate::Resolution;
use packagejson::PackageJson;
use path_clean::PathClean;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tries every extension-expanded candidate for `file`; the first one the
/// filesystem reports as a regular file or named pipe wins.
///
/// A match on the empty-shim path itself never carries the owning
/// package: the shim is a fixed, configuration-supplied file outside any
/// package directory, reached only by following an `alias: false` rewrite,
/// not by literally probing a file the package ships.
pub fn load_as_file(
    fs: &dyn FileSystem,
    file: &str,
    exts: &[String],
    pkg: Option<Arc<PackageJson>>,
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
) -> Option<Resolution> {
    for candidate in expand_file(file, exts, pkg.as_deref(), root_pkg, empty_shim, true) {
        let path = PathBuf::from(&candidate);
        if fs.stat(&path).is_some_and(|s| s.is_file || s.is_fifo) {
            let pkg = if path == empty_shim { None } else { pkg.clone() };
            return Some(Resolution::File { path, pkg });
        }
    }
    None
}

/// Reads `dir`'s manifest (silently absent on any failure); if present,
/// follows its entry point, falling back to `dir/index` when there is no
/// manifest. `visited` guards against a manifest whose entry point
/// resolves back into its own directory, recursing forever.
pub fn load_directory(
    fs: &dyn FileSystem,
    manifests: &ManifestCache,
    dir: &Path,
    exts: &[String],
    pkg: Option<Arc<PackageJson>>,
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Option<Resolution> {
    let manifest = manifests
        .read(fs, dir)
        .filter(|m| visited.insert(m.pkgfile.clone()));

    let Some(manifest) = manifest else {
        let index = dir.join("index");
        return load_as_file(
            fs,
            &index.to_string_lossy(),
            exts,
            pkg,
            root_pkg,
            empty_shim,
        );
    };

    let main_abs = manifest.pkgdir.join(manifest.main_entry()).clean();
    let main_str = main_abs.to_string_lossy().into_owned();

    if let Some(res) = load_as_file(
        fs,
        &main_str,
        exts,
        Some(manifest.clone()),
        root_pkg,
        empty_shim,
    ) {
        return Some(res);
    }

    load_directory(
        fs,
        manifests,
        &main_abs,
        exts,
        Some(manifest),
        root_pkg,
        empty_shim,
        visited,
    )
}

/// Locates the package owning `file` and tries it as a file, then as a
/// directory.
pub fn load_relative(
    fs: &dyn FileSystem,
    manifests: &ManifestCache,
    file: &Path,
    exts: &[String],
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
) -> Option<Resolution> {
    let dir = file.parent().unwrap_or(file);
    let pkg = manifests.find_package(fs, dir);
    let file_str = file.to_string_lossy().into_owned();

    if let Some(res) = load_as_file(fs, &file_str, exts, pkg.clone(), root_pkg, empty_shim) {
        return Some(res);
    }

    let mut visited = HashSet::new();
    load_directory(fs, manifests, file, exts, pkg, root_pkg, empty_shim, &mut visited)
}

/// Loads a match produced by the `node_modules` walker. A non-empty
/// subpath is tried as a file only (e.g. `lodash/fp` probes `fp.js`, not
/// `fp/index.js`); an empty subpath defers entirely to the directory
/// loader, which reads the package manifest itself.
pub fn load_node_modules(
    fs: &dyn FileSystem,
    manifests: &ManifestCache,
    module_dir: &Path,
    sub_path: &str,
    file_path: &Path,
    exts: &[String],
    root_pkg: Option<&PackageJson>,
    empty_shim: &Path,
) -> Option<Resolution> {
    if !sub_path.is_empty() {
        let pkg = manifests.read(fs, module_dir);
        let file_str = file_path.to_string_lossy().into_owned();
        return load_as_file(fs, &file_str, exts, pkg, root_pkg, empty_shim);
    }

    let mut visited = HashSet::new();
    load_directory(
        fs, manifests, file_path, exts, None, root_pkg, empty_shim, &mut visited,
    )
}
