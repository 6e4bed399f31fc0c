//! Exit codes for candictl

/// Exit code for success (Success or Info answer)
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code when the answer is a Warning or Error
pub const EXIT_NOT_ANSWERED: i32 = 1;

/// Exit code when the data document cannot be read
pub const EXIT_SOURCE_UNREADABLE: i32 = 66;

/// Exit code for usage or configuration errors
pub const EXIT_USAGE: i32 = 64;
