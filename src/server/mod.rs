// HTTP surface — router, handlers, and the canned report catalog.

pub mod handler;
pub mod reports;

pub use handler::{router, AppServer};
