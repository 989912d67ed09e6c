//! Review thread selection predicates.

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::github::models::ReviewThread;

/// Which review threads to keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ThreadFilter {
    /// Every thread.
    #[default]
    All,
    /// Threads not yet resolved.
    Unresolved,
    /// Resolved threads on current code.
    ResolvedActive,
    /// Unresolved threads whose code has since changed.
    UnresolvedOutdated,
    /// Unresolved threads on current code.
    CurrentUnresolved,
}

impl ThreadFilter {
    /// Returns true when `thread` passes this filter.
    #[must_use]
    pub const fn matches(self, thread: &ReviewThread) -> bool {
        match self {
            Self::All => true,
            Self::Unresolved => !thread.is_resolved,
            Self::ResolvedActive => thread.is_resolved && !thread.is_outdated,
            Self::UnresolvedOutdated => !thread.is_resolved && thread.is_outdated,
            Self::CurrentUnresolved => !thread.is_resolved && !thread.is_outdated,
        }
    }

    /// Keeps the threads passing this filter, preserving order.
    pub fn apply<'a>(
        self,
        threads: impl IntoIterator<Item = &'a ReviewThread>,
    ) -> impl Iterator<Item = &'a ReviewThread> {
        threads.into_iter().filter(move |thread| self.matches(thread))
    }

    /// CLI name of the filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unresolved => "unresolved",
            Self::ResolvedActive => "resolved-active",
            Self::UnresolvedOutdated => "unresolved-outdated",
            Self::CurrentUnresolved => "current-unresolved",
        }
    }
}

impl FromStr for ThreadFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "all" => Ok(Self::All),
            "unresolved" => Ok(Self::Unresolved),
            "resolved-active" => Ok(Self::ResolvedActive),
            "unresolved-outdated" => Ok(Self::UnresolvedOutdated),
            "current-unresolved" => Ok(Self::CurrentUnresolved),
            _ => Err(AppError::configuration(format!(
                "unsupported thread filter '{s}': valid options are all, unresolved, \
                 resolved-active, unresolved-outdated, current-unresolved"
            ))),
        }
    }
}

impl fmt::Display for ThreadFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
