//! Present-value engine: discounted streams and the BEL, RA, CSM and loss measures

mod measures;
mod pv;

pub use measures::Measure;
pub use pv::Stream;
