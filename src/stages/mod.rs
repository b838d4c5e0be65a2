pub mod aggregate;
pub mod extract;
pub mod normalize;
pub mod textgrid;

pub use aggregate::*;
pub use extract::*;
pub use normalize::*;
pub use textgrid::*;
