/// The only error variant a caller of [`crate::Resolver::resolve`] ever
/// sees. Every other failure mode (a missing or malformed `package.json`,
/// a `stat` call against a path that doesn't exist, a `realpath` that
/// errors out) is recoverable and is swallowed at the site that triggered
/// it, then treated as "no result".
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Cannot resolve module {specifier:?} from {from}")]
    ModuleNotFound { specifier: String, from: String },
}

impl ResolveError {
    pub(crate) fn not_found(specifier: &str, from: &std::path::Path) -> Self {
        ResolveError::ModuleNotFound {
            specifier: specifier.to_owned(),
            from: from.display().to_string(),
        }
    }
}
