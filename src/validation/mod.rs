//! Directory validation
//!
//! Pure checks that keep task mount and work directories inside their base
//! directory. Nothing here writes to the filesystem.

pub mod dirs;

pub use self::dirs::{
    dir_is_valid, find_git_root, is_valid_dir, path_to_absolute, validate_containment,
};
