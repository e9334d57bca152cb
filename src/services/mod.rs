pub mod merger;
pub mod workspace;

pub use merger::{count_pages, merge_pages};
pub use workspace::TempWorkspace;
