pub mod dom;
pub mod runtime;

pub use dom::WebDom;
pub use runtime::{install, log_uncaught_errors, uncaught_errors, Runtime};
