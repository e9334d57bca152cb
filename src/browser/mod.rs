pub mod headless;

pub use headless::{BrowserOptions, BrowserSession};
