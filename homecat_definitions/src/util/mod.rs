mod require;

pub use require::Require;
