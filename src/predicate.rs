// Build predicates.
// Caller-supplied filters applied to the final record set.

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::Build;

/// Answers "does this record match?". Implement this to define new filter
/// kinds; the fetcher only ever calls [`matches`](BuildPredicate::matches).
pub trait BuildPredicate: Send + Sync {
    fn matches(&self, build: &Build) -> bool;
}

/// Matches builds whose pipeline name and branch both satisfy a regex.
pub struct PatternFilter {
    pipelines: Regex,
    branches: Regex,
}

impl PatternFilter {
    pub fn new(pipelines: &str, branches: &str) -> Result<Self> {
        Ok(Self {
            pipelines: compile(pipelines)?,
            branches: compile(branches)?,
        })
    }
}

impl BuildPredicate for PatternFilter {
    fn matches(&self, build: &Build) -> bool {
        self.pipelines.is_match(&build.pipeline) && self.branches.is_match(&build.branch)
    }
}

/// Matches every build.
pub struct MatchAll;

impl BuildPredicate for MatchAll {
    fn matches(&self, _build: &Build) -> bool {
        true
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidQuery(format!("bad pattern {pattern:?}: {e}")))
}
