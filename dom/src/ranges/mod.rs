pub mod boundary_point;
pub mod mutators;
pub mod process_contents;
pub mod range;
pub mod validation;

pub use boundary_point::*;
pub use process_contents::ContentAction;
pub use range::*;
