//! Package manifest cache. Locates, reads, and memoizes
//! `package.json` files, applying the "source field requires symlink"
//! rule before a manifest is handed to any other component.

use crate::fs::FileSystem;
use dashmap::DashMap;
use packagejson::PackageJson;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Caches parsed manifests by the absolute path of their `package.json`
/// file. Shared by every component that needs to read a manifest, so a
/// given file is parsed at most once for the resolver's lifetime.
#[derive(Default)]
pub struct ManifestCache {
    by_pkgfile: DashMap<PathBuf, Arc<PackageJson>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and caches the manifest at `dir/package.json`. A missing
    /// file, an I/O failure, or malformed JSON is folded into `None`
    /// rather than surfaced: per the resolver's error model, an unreadable
    /// manifest just means "no manifest here."
    pub fn read(&self, fs: &dyn FileSystem, dir: &Path) -> Option<Arc<PackageJson>> {
        let pkgfile = dir.join("package.json");
        if let Some(hit) = self.by_pkgfile.get(&pkgfile) {
            return Some(hit.clone());
        }

        let text = fs.read_file(&pkgfile)?;
        let mut pkg = PackageJson::parse(&text).ok()?;
        pkg.pkgfile = pkgfile.clone();
        pkg.pkgdir = dir.to_path_buf();
        self.apply_source_symlink_rule(fs, &mut pkg);

        let pkg = Arc::new(pkg);
        // Concurrent first reads of the same pkgfile both parse; whichever
        // insert wins, the stored value is equal, so this is safe without
        // a separate lock around the read-then-insert sequence.
        self.by_pkgfile.insert(pkgfile, pkg.clone());
        Some(pkg)
    }

    /// `source` is honored only for locally-linked packages under active
    /// development. If `pkgfile`'s realpath equals its literal path (it is
    /// not a symlink), the field is dropped from the cached manifest.
    fn apply_source_symlink_rule(&self, fs: &dyn FileSystem, pkg: &mut PackageJson) {
        if pkg.source.is_none() {
            return;
        }
        let is_symlinked = fs
            .realpath(&pkg.pkgfile)
            .is_some_and(|real| real != pkg.pkgfile);
        if !is_symlinked {
            pkg.discard_source();
        }
    }

    /// Walks upward from `dir`, returning the first manifest that reads
    /// successfully. Stops once the current directory's basename is
    /// `node_modules` (a manifest is never looked for there) or the
    /// filesystem root has been reached.
    pub fn find_package(&self, fs: &dyn FileSystem, dir: &Path) -> Option<Arc<PackageJson>> {
        let mut current = dir.to_path_buf();
        loop {
            let at_node_modules = current
                .file_name()
                .is_some_and(|name| name == "node_modules");
            if at_node_modules {
                return None;
            }
            if let Some(pkg) = self.read(fs, &current) {
                return Some(pkg);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return None,
            }
        }
    }
}
