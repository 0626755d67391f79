/// Enumeration of all errors that can be returned.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Name doesn't follow the graph resource naming rules.
    ///
    /// Names must start with `~`, `/` or a letter, and may only contain
    /// letters, digits, underscores and slashes. The empty name is allowed
    /// and stands for "unset".
    #[error("graph name `{name}` is invalid, {reason}")]
    InvalidName {
        /// The name that failed validation.
        name: String,
        /// Reason for the failure.
        reason: String,
    },
    /// Name cannot be resolved in the requested namespace.
    ///
    /// Resolution requires a global namespace, and private `~names` can only
    /// be resolved by the node that owns them.
    #[error("cannot resolve `{name}`, {reason}")]
    NameResolution {
        /// The name being resolved.
        name: String,
        /// Reason for the failure.
        reason: String,
    },
}

/// Convenience type for shorter return value syntax of this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;
