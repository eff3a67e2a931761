//! # QuickCopy
//!
//! Generates the bodies of struct-to-struct copy functions.
//!
//! Write a stub, mark it with `#[quickcopy]` and run the `quickcopy` tool over
//! the crate. The tool fills the body in and appends the helpers it needs for
//! nested records and sequences.
//!
//! # Example
//! ```
//!   use quickcopy::quickcopy;
//!
//!   pub struct User {
//!     pub name: String,
//!     pub age: i32,
//!   }
//!
//!   #[derive(Default)]
//!   pub struct UserDto {
//!     pub name: String,
//!     pub age: String,
//!   }
//!
//!   // as left by the tool
//!   #[quickcopy]
//!   fn copy_user(dst: &mut UserDto, src: &User) {
//!     dst.name = src.name.clone();
//!     dst.age = quickcopy::convert::int_to_text(&src.age);
//!   }
//!
//!   let mut dto = UserDto::default();
//!   copy_user(&mut dto, &User { name: "Ann".to_string(), age: 7 });
//!   assert_eq!(dto.name, "Ann");
//!   assert_eq!(dto.age, "7");
//! ```
//!
//! Field level options go on records deriving `QuickCopy`:
//!
//! ```
//!   use quickcopy::QuickCopy;
//!
//!   #[derive(QuickCopy, Default)]
//!   pub struct TagDto {
//!     #[copy(from = "name")]
//!     pub label: String,
//!     #[copy(skip)]
//!     pub computed: u64,
//!   }
//! ```

pub use quickcopy_macros::{quickcopy, QuickCopy};

pub mod convert;

pub use uuid::Uuid;

/// UTC point in time, the timestamp type builtin conversions work with.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
