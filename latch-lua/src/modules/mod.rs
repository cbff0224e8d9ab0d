//! Helper modules installed into every expression environment

pub mod event;
pub mod strings;

pub use event::EventModule;
pub use strings::StringsModule;
