//! Process exit codes

/// Successful termination
pub const OK: i32 = 0;

/// Unrecoverable step failure, cleanup validation error or user abort
pub const FAILURE: i32 = 1;

/// Command line usage or validation error
pub const USAGE: i32 = 2;

/// Required external tool (the `aws` client) not found
pub const MISSING_TOOL: i32 = 3;

/// Artifact to deploy does not exist
pub const MISSING_ARTIFACT: i32 = 4;

/// Terminated by Ctrl-C
pub const INTERRUPTED: i32 = 130;
