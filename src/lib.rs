pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod finder;
pub mod history;
pub mod merge;
pub mod model;
pub mod output;

pub use config::{MergeOrder, ReviewerOptions};
pub use error::{Result, ReviewersError};
pub use filter::FilterPolicy;
pub use finder::ReviewerFinder;
pub use history::{GitCommandHistory, GixHistory, HistoryProvider, SinceBound};
pub use model::{FailedPath, ReviewerReport, Stat, Stats};
