use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReviewersError>;

#[derive(Error, Debug)]
pub enum ReviewersError {
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Invalid reference: {0}")]
    Reference(String),
    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("History provider error: {0}")]
    Provider(String),
    #[error("History query for '{path}' failed: {message}")]
    History { path: String, message: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
}

impl ReviewersError {
    /// Attach the path whose history query produced this error.
    pub fn for_path(self, path: &str) -> Self {
        match self {
            err @ ReviewersError::History { .. } => err,
            other => ReviewersError::History {
                path: path.to_string(),
                message: other.to_string(),
            },
        }
    }
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::object::find::existing::Error> for ReviewersError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        ReviewersError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for ReviewersError {
    fn from(err: gix::object::commit::Error) -> Self {
        ReviewersError::Commit(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for ReviewersError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        ReviewersError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for ReviewersError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        ReviewersError::HeadPeel(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for ReviewersError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        ReviewersError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for ReviewersError {
    fn from(err: gix::objs::decode::Error) -> Self {
        ReviewersError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for ReviewersError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        ReviewersError::DiffTreeToTree(Box::new(err))
    }
}

impl From<gix::discover::Error> for ReviewersError {
    fn from(err: gix::discover::Error) -> Self {
        ReviewersError::GitDiscover(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_path_wraps_provider_errors() {
        let err = ReviewersError::Provider("exit status 128".into()).for_path("src/lib.rs");
        assert_eq!(
            err.to_string(),
            "History query for 'src/lib.rs' failed: History provider error: exit status 128"
        );
    }

    #[test]
    fn for_path_keeps_existing_history_error() {
        let err = ReviewersError::History {
            path: "a.go".into(),
            message: "boom".into(),
        }
        .for_path("b.go");
        assert!(err.to_string().contains("'a.go'"));
    }

    #[test]
    fn command_error_shows_stderr() {
        let err = ReviewersError::Command {
            command: "git diff --name-only master HEAD".into(),
            stderr: "fatal: bad revision 'master'".into(),
        };
        assert!(err.to_string().contains("bad revision"));
    }
}
