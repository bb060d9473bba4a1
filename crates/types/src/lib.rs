mod block;
mod error;
mod record;
mod selection;
pub mod test_utils;
mod units;
mod verdict;

pub use block::*;
pub use error::*;
pub use record::*;
pub use selection::*;
pub use units::*;
pub use verdict::*;

pub type Slot = u64;
