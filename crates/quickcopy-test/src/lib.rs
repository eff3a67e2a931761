//! Records and copy functions in the shape the `quickcopy` tool leaves them.

pub mod api;
pub mod model;
