//! External capability traits.

mod publisher;
mod resolver;

pub use publisher::Publisher;
pub use resolver::ContentResolver;
