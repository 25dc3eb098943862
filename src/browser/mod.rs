pub mod headless;
pub mod selectors;

pub use headless::{launch_headless_browser, LaunchedBrowser};
pub use selectors::SelectorSet;
