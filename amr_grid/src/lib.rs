//! # amr_grid
//! The external-interface boundary: the AMR grid reader, the
//! block-partitioning/link framework, and the bulk-synchronous `exchange`
//! primitive. None of these are implemented here beyond traits (and a small
//! in-memory reference backend used by `amr_engine`'s own tests) — the real
//! I/O layer and partitioning fabric are external collaborators, the same
//! way `pointcloud` is an accessor layer that `goko` depends on without
//! owning the file formats itself.
#![allow(dead_code)]
#![warn(missing_docs)]

pub mod errors;
pub use errors::{GridError, GridResult};

mod bounds;
pub use bounds::BoxBounds;

mod grid_reader;
pub use grid_reader::GridReader;

mod link;
pub use link::{NeighborLink, PartitionLink};

mod exchange;
pub use exchange::Exchange;

pub mod memory;
