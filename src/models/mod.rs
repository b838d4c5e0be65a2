pub mod alignment;
pub mod elan;
pub mod textgrid;
pub mod transcriber;
pub mod utterance;

pub use alignment::*;
pub use elan::*;
pub use textgrid::*;
pub use transcriber::*;
pub use utterance::*;
