//! Business operations over the repositories.
//!
//! Every operation walks the ownership chain user -> list -> task before it
//! reads or writes anything. A list that exists but belongs to someone else
//! is reported exactly like a list that does not exist.

pub mod todo_list;
pub mod todo_task;
pub mod user;

/// Resolve the version a write should be conditioned on: the one the client
/// read, or the one just loaded when the client did not send any.
pub(crate) fn expected_version(requested: Option<i32>, current: i32) -> i32 {
    requested.unwrap_or(current)
}
