/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The prompt or the content is blocked by the provider.
    Moderated,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// The credential is missing or rejected by the provider.
    Unauthorized,
    /// Any other errors.
    Other,
}
