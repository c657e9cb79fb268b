//! Process-level error type.
//!
//! Every fallible path in the crate returns an `AppError` carrying a message
//! and a process exit code. The exit codes double as a coarse error taxonomy
//! so scripts driving `epi` can tell failure classes apart:
//!
//! - `2` — configuration / environment / file errors (invalid parameters,
//!   an integration window with end before start, unreadable config file)
//! - `3` — data / lookup errors (unknown country, empty or malformed series)
//! - `4` — anchor-search failure (the seed trajectory never exceeds the
//!   minimum observed count; depends on both parameters and data, so it is
//!   deliberately distinct from a plain configuration error)
//! - `5` — numerical failure (non-finite state during integration)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Configuration, environment, or file error (exit 2).
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Data or lookup error (exit 3).
    pub fn lookup(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Anchor-search failure (exit 4).
    pub fn anchor(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    /// Numerical failure during integration (exit 5).
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::new(5, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
