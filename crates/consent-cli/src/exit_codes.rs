//! Exit codes of the `consent` binary. Scripts branch on these.

pub const EXIT_SUCCESS: i32 = 0;
/// Precondition not met or negative answer (pair missing, already present, not accepted).
pub const EXIT_NEGATIVE: i32 = 1;
/// Configuration, input or storage error.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Map a two-state store result to an exit code.
pub fn from_outcome(ok: bool) -> i32 {
    if ok {
        EXIT_SUCCESS
    } else {
        EXIT_NEGATIVE
    }
}
