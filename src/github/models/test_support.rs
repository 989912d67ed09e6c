//! Test helpers for constructing review thread fixtures.
//!
//! # Examples
//!
//! ```
//! use prsweep::github::models::test_support::{suggestion_comment, thread_with_state};
//!
//! let mut thread = thread_with_state("PRRT_1", false, true);
//! thread.comments.push(suggestion_comment("PRRC_1"));
//! assert_eq!(thread.suggestion_ids().len(), 1);
//! ```

use super::{ReviewThread, ThreadComment};
use crate::github::ids::ThreadId;

/// Constructs a review thread with the given id and state and no comments.
///
/// # Panics
///
/// Panics when `id` is not a valid node id; fixtures are expected to use
/// literal ids.
#[must_use]
pub fn thread_with_state(id: &str, is_resolved: bool, is_outdated: bool) -> ReviewThread {
    let thread_id =
        ThreadId::new(id).unwrap_or_else(|error| panic!("fixture thread id {id:?}: {error}"));
    ReviewThread {
        id: thread_id,
        is_resolved,
        is_outdated,
        path: Some("src/lib.rs".to_owned()),
        line: Some(1),
        comments: Vec::new(),
    }
}

/// Constructs a comment carrying a suggested change.
#[must_use]
pub fn suggestion_comment(id: &str) -> ThreadComment {
    ThreadComment {
        id: id.to_owned(),
        body: Some("```suggestion\nlet value = 1;\n```".to_owned()),
        author: Some("reviewer".to_owned()),
        created_at: None,
    }
}

/// Constructs a plain remark without a suggestion.
#[must_use]
pub fn remark_comment(id: &str, body: &str) -> ThreadComment {
    ThreadComment {
        id: id.to_owned(),
        body: Some(body.to_owned()),
        author: Some("reviewer".to_owned()),
        created_at: None,
    }
}
