// Text output for terminals and logs
pub mod console;

pub use console::render;
