/// Exit codes of the gmark CLI, following the BSD sysexits convention where
/// one applies.
///
/// Successful termination
pub const SUCCESS: i32 = 0;

/// The server or database rejected or failed the request
pub const FAILURE: i32 = 1;

/// Command line usage error - invalid arguments, missing required parameters, etc.
pub const USAGE: i32 = 64;

/// Input data was rejected, e.g. a cross-owner assignment
pub const DATAERR: i32 = 65;

/// Configuration file missing or malformed
pub const CONFIG: i32 = 78;
