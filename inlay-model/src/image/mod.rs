pub mod dimensions;
pub mod placeholder;

pub use dimensions::*;
pub use placeholder::*;
