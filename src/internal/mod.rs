//! Internal implementation details.

pub(crate) mod path;

pub(crate) use path::{with_path, PathGuard};
