//! The slicing pipeline: dimension selection, partitioning, slice building and orchestration.
//!
//! Each stage is a pure function of the previous one, so the stages can be tested
//! independently and modules can be sliced in any order.

mod dimensions;
mod generator;
mod partition;
mod slice;

pub use dimensions::select_split_dimensions;
pub use generator::{AssetSlicesGenerator, ModuleOutcome, generate, slice_module};
pub use partition::{Partition, PartitionKey, Partitioning, partition_directories};
pub use slice::SliceBuilder;
