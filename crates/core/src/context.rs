//! Diagnostic context threaded through a single render call.

use std::fmt;

/// Identifies the post or comment being rendered.
///
/// Only recorded on the tracing span of a render call; it never changes the
/// rendered bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostContext {
    pub author: Option<String>,
    pub permlink: Option<String>,
}

impl PostContext {
    pub fn new(author: impl Into<String>, permlink: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
            permlink: Some(permlink.into()),
        }
    }
}

impl fmt::Display for PostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.author, &self.permlink) {
            (Some(author), Some(permlink)) => write!(f, "@{author}/{permlink}"),
            (Some(author), None) => write!(f, "@{author}"),
            (None, Some(permlink)) => write!(f, "{permlink}"),
            (None, None) => f.write_str("<unknown post>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_author_and_permlink() {
        let ctx = PostContext::new("alice", "my-first-post");
        assert_eq!(ctx.to_string(), "@alice/my-first-post");
        assert_eq!(PostContext::default().to_string(), "<unknown post>");
    }
}
