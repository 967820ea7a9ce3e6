//! `node_modules` walker. Locates the package directory owning a bare
//! module name by walking ancestor directories, short-circuiting on a
//! builtin shim and skipping nested `node_modules/node_modules` probes.

use crate::fs::FileSystem;
use crate::splitter::split_module_specifier;
use packagejson::BuiltinShimTable;
use std::path::{Path, PathBuf};

/// Outcome of walking for a bare module name.
pub enum NodeModulesResult {
    /// `name` matched the builtin-shim table; resolution is done.
    BuiltinShim(PathBuf),
    /// A `node_modules/<pkg>` directory was found.
    Match {
        module_name: String,
        sub_path: String,
        module_dir: PathBuf,
        file_path: PathBuf,
    },
    /// The walk reached the filesystem root without finding the package.
    NotFound {
        module_name: String,
        sub_path: String,
    },
}

/// Walks upward from `dir` looking for `node_modules/<pkg>`, where `pkg`
/// is `name` split via [`split_module_specifier`].
pub fn locate(
    fs: &dyn FileSystem,
    name: &str,
    dir: &Path,
    builtin_shims: &BuiltinShimTable,
) -> NodeModulesResult {
    if let Some(shim) = builtin_shims.get(name) {
        return NodeModulesResult::BuiltinShim(shim.clone());
    }

    let (pkg, sub) = split_module_specifier(name);
    let mut current = dir.to_path_buf();

    loop {
        if current.file_name().is_some_and(|n| n == "node_modules") {
            match current.parent() {
                Some(parent) => {
                    current = parent.to_path_buf();
                    continue;
                }
                None => break,
            }
        }

        let module_dir = current.join("node_modules").join(pkg);
        if fs.stat(&module_dir).is_some_and(|s| s.is_dir) {
            let file_path = current.join("node_modules").join(name);
            return NodeModulesResult::Match {
                module_name: pkg.to_owned(),
                sub_path: sub.to_owned(),
                module_dir,
                file_path,
            };
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    NodeModulesResult::NotFound {
        module_name: pkg.to_owned(),
        sub_path: sub.to_owned(),
    }
}
