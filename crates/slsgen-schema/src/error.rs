use thiserror::Error;

/// Errors produced during schema resolution (E2003).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// E2003: The gateway accepts at most one alternative under a composition keyword.
    #[error(
        "E2003: model '{model}' has {count} schemas under '{keyword}'; the API gateway supports at most one"
    )]
    MultipleAlternatives {
        model: String,
        keyword: &'static str,
        count: usize,
    },
}
