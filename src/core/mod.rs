//! Image construction pipeline: collect, lay out, write

pub mod builder;
pub mod codec;
pub mod collect;
pub mod layout;
pub mod ledger;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::ImageBuilder;
