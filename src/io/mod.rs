pub mod input;
pub mod kaldi;
pub mod locate;
pub mod output;

pub use input::*;
pub use kaldi::*;
pub use locate::*;
pub use output::*;
