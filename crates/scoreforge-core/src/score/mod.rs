//! Score types for representing solution quality
//!
//! Scores compare solutions and guide the optimization process. All score
//! types are immutable and implement arithmetic operations. [`InnerScore`]
//! augments a raw score with the count of still unassigned elements.

#[macro_use]
mod macros;

mod hard_soft;
mod inner;
mod level;
mod simple;
mod traits;


pub use hard_soft::HardSoftScore;
pub use inner::{InnerScore, ScoreSnapshot};
pub use level::ScoreLevel;
pub use simple::SimpleScore;
pub use traits::Score;
