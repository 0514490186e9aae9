//! Custom secondary indexes maintained by the application.
//!
//! Native secondary indexes only support equality lookups on low-cardinality columns. The
//! indexes here are plain column families written next to the main table, which makes
//! range queries, paging, prefix/suffix string matching and counting possible.

pub mod all_rows;
pub mod custom;
pub mod entry_handler;
pub mod enum_index;
pub mod integrator;
pub mod shard;
pub mod string_index;

pub use all_rows::AllRowsSecondaryIndex;
pub use custom::{CustomSecondaryIndex, GenericCustomSecondaryIndex};
pub use entry_handler::{IndexEntry, IndexEntryHandler};
pub use enum_index::EnumSecondaryIndex;
pub use integrator::{
    AllRowsIndexReader, CustomIndexReader, SecondaryIndexIntegrator, SecondaryIndexReader,
    StringIndexReader,
};
pub use shard::{HashShardStrategy, ShardSize, ShardStrategy, StringShardStrategy, TimeShardStrategy};
pub use string_index::{
    IndexEntryMutator, StringIndexEntry, StringIndexEntryFactory, StringQuery,
    StringSecondaryIndex, DEFAULT_SCAN_PAGE_SIZE,
};
