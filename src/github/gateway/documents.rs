//! GraphQL documents for review thread operations.

use serde_json::json;

use super::GraphqlRequest;
use crate::github::ids::{SuggestionId, ThreadId};
use crate::github::locator::PullRequestLocator;

/// Review threads fetched per page.
pub(crate) const THREADS_PAGE_SIZE: u32 = 100;

/// Comments fetched per thread.
pub(crate) const COMMENTS_PER_THREAD: u32 = 50;

const RESOLVE_THREAD: &str = "\
mutation ResolveReviewThread($threadId: ID!) {
  resolveReviewThread(input: {threadId: $threadId}) {
    thread { id isResolved }
  }
}";

const APPLY_SUGGESTION: &str = "\
mutation ApplySuggestion($suggestionId: ID!) {
  applySuggestion(input: {suggestionId: $suggestionId}) {
    success
    message
  }
}";

const REVIEW_THREADS: &str = "\
query ReviewThreads($owner: String!, $repo: String!, $number: Int!, $first: Int!, $comments: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviewThreads(first: $first, after: $cursor) {
        nodes {
          id
          isResolved
          isOutdated
          path
          line
          comments(first: $comments) {
            nodes { id body createdAt author { login } }
          }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}";

pub(crate) fn resolve_thread(thread_id: &ThreadId) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "ResolveReviewThread",
        query: RESOLVE_THREAD,
        variables: json!({ "threadId": thread_id.as_str() }),
    }
}

pub(crate) fn apply_suggestion(suggestion_id: &SuggestionId) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "ApplySuggestion",
        query: APPLY_SUGGESTION,
        variables: json!({ "suggestionId": suggestion_id.as_str() }),
    }
}

pub(crate) fn review_threads(locator: &PullRequestLocator, cursor: Option<&str>) -> GraphqlRequest {
    GraphqlRequest {
        operation_name: "ReviewThreads",
        query: REVIEW_THREADS,
        variables: json!({
            "owner": locator.owner().as_str(),
            "repo": locator.repository().as_str(),
            "number": locator.number().get(),
            "first": THREADS_PAGE_SIZE,
            "comments": COMMENTS_PER_THREAD,
            "cursor": cursor,
        }),
    }
}
