use crate::config::ReviewerOptions;

/// Extensions of files that are mostly machine-edited and say little about
/// who knows the code.
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &["svg", "json", "nock", "xml"];

/// Decides which changed paths count toward reviewer attribution.
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    ignored_extensions: Vec<String>,
    only_extensions: Vec<String>,
    ignored_paths: Vec<String>,
    only_paths: Vec<String>,
}

impl FilterPolicy {
    pub fn from_options(options: &ReviewerOptions) -> Self {
        let ignored_extensions = DEFAULT_IGNORED_EXTENSIONS
            .iter()
            .map(|ext| ext.to_string())
            .chain(options.ignored_extensions.iter().cloned())
            .collect();

        Self {
            ignored_extensions,
            only_extensions: options.only_extensions.clone(),
            ignored_paths: options.ignored_paths.clone(),
            only_paths: options.only_paths.clone(),
        }
    }

    pub fn should_consider(&self, path: &str) -> bool {
        self.consider_ext(path) && self.consider_path(path)
    }

    /// An allow-list wins outright; otherwise the path must avoid every
    /// ignored suffix.
    pub fn consider_ext(&self, path: &str) -> bool {
        match (
            self.only_extensions.is_empty(),
            self.ignored_extensions.is_empty(),
        ) {
            (true, true) => true,
            (false, _) => self
                .only_extensions
                .iter()
                .any(|ext| path.ends_with(ext.as_str())),
            (true, false) => !self
                .ignored_extensions
                .iter()
                .any(|ext| path.ends_with(ext.as_str())),
        }
    }

    /// Prefixes only match when they leave something behind, so a path equal
    /// to a prefix is neither selected by `only_paths` nor excluded by
    /// `ignored_paths`.
    pub fn consider_path(&self, path: &str) -> bool {
        match (self.only_paths.is_empty(), self.ignored_paths.is_empty()) {
            (true, true) => true,
            (false, _) => self
                .only_paths
                .iter()
                .any(|prefix| has_strict_prefix(path, prefix)),
            (true, false) => !self
                .ignored_paths
                .iter()
                .any(|prefix| has_strict_prefix(path, prefix)),
        }
    }
}

fn has_strict_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .map(|rest| rest.len() < path.len() && !rest.is_empty())
        .unwrap_or(false)
}
