//! Path classifier. Determines the shape of a request string and,
//! for every shape except `Bare`, computes its absolute candidate path.

use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// The kind of request a specifier was classified as, tagged with enough
/// information for the caller to act on it without re-inspecting the
/// original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// `input` contained a glob metacharacter and was recognized as a
    /// non-trivial glob pattern. Carries the original pattern text; the
    /// driver resolves it to an absolute (but unexpanded) path.
    Glob(String),
    /// `/`-prefixed: rooted at the project root.
    Absolute(PathBuf),
    /// `~`-prefixed: rooted at the nearest package boundary.
    Tilde(PathBuf),
    /// `.`-prefixed: resolved relative to the issuing file's directory.
    Relative(PathBuf),
    /// Anything else: a `node_modules` package name, possibly with a
    /// subpath, left for the node_modules walker to resolve.
    Bare(String),
}

/// Characters that mark a specifier as a (candidate) glob pattern.
const GLOB_META: [char; 4] = ['*', '+', '{', '}'];

/// Returns true if `input` contains a glob metacharacter *and* that
/// metacharacter is used in a way a glob engine would treat as meaningful:
/// a bare `*` wildcard, a brace-expansion pair `{...}`, or an extglob
/// group `+(...)`. A lone `+` in an ordinary filename (`foo+bar.js`) does
/// not count.
pub fn is_glob_pattern(input: &str) -> bool {
    if !input.chars().any(|c| GLOB_META.contains(&c)) {
        return false;
    }
    if input.contains('*') {
        return true;
    }
    if input.contains('{') && input.contains('}') {
        return true;
    }
    if input.contains("+(") {
        return true;
    }
    false
}

/// Classifies `input`, issued from a file in directory `dir` (the
/// dirname of the parent file, or the working directory for an
/// entrypoint-level call). `root_dir` anchors `/`-prefixed requests.
pub fn classify(input: &str, dir: &Path, root_dir: &Path) -> ModuleKind {
    if is_glob_pattern(input) {
        return ModuleKind::Glob(input.to_owned());
    }

    let mut chars = input.chars();
    match chars.next() {
        Some('/') => ModuleKind::Absolute(root_dir.join(&input[1..]).clean()),
        Some('~') => {
            let rest = input[1..].strip_prefix('/').unwrap_or(&input[1..]);
            ModuleKind::Tilde(resolve_tilde(dir, rest, root_dir))
        }
        Some('.') => ModuleKind::Relative(dir.join(input).clean()),
        _ => ModuleKind::Bare(normalize_bare(input)),
    }
}

/// Walks up from `dir` while the parent directory's basename is not
/// `node_modules` and `dir` has not reached `root_dir`, then joins the
/// remainder of the tilde specifier onto the boundary found. This anchors
/// tilde resolution to the nearest package boundary.
fn resolve_tilde(dir: &Path, rest: &str, root_dir: &Path) -> PathBuf {
    let mut boundary = dir.to_path_buf();
    loop {
        if boundary == root_dir {
            break;
        }
        let is_under_node_modules = boundary
            .parent()
            .and_then(|p| p.file_name())
            .is_some_and(|name| name == "node_modules");
        if is_under_node_modules {
            break;
        }
        match boundary.parent() {
            Some(parent) => boundary = parent.to_path_buf(),
            None => break,
        }
    }
    boundary.join(rest).clean()
}

/// Normalizes a bare-module specifier's path separators for the current
/// platform. On Unix this is a no-op; on Windows it turns `\`-separated
/// input into `/`-separated form so the splitter and walker can split on a
/// single separator.
fn normalize_bare(input: &str) -> String {
    use path_slash::PathExt;
    Path::new(input)
        .to_slash()
        .map(|s| s.into_owned())
        .unwrap_or_else(|| input.to_owned())
}
