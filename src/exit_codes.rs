//! Exit codes for clean-py, following Ruff's convention
//!
//! These exit codes allow users and CI/CD systems to distinguish between
//! different types of failures.

/// Success - Every file was cleaned (or already clean)
pub const SUCCESS: i32 = 0;

/// One or more files could not be cleaned
pub const FILES_FAILED: i32 = 1;

/// Tool error - Bad arguments, configuration error, or internal error
pub const TOOL_ERROR: i32 = 2;

/// Helper functions for consistent exit behavior
pub mod exit {
    use super::{FILES_FAILED, SUCCESS, TOOL_ERROR};

    /// Exit with success code (0)
    pub fn success() -> ! {
        std::process::exit(SUCCESS);
    }

    /// Exit with files failed code (1)
    pub fn files_failed() -> ! {
        std::process::exit(FILES_FAILED);
    }

    /// Exit with tool error code (2)
    pub fn tool_error() -> ! {
        std::process::exit(TOOL_ERROR);
    }
}
