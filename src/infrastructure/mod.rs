pub mod chromium_session;
pub mod js_executor;
pub mod session;

pub use chromium_session::{ChromiumSession, ChromiumSessionFactory};
pub use js_executor::JsExecutor;
pub use session::{ItemDetailExtractor, PageLoad, SessionFactory};
