//! k-NN passage index: the query port, Pinecone over HTTP, and an in-memory backend.

pub mod error;
pub mod in_memory;
pub mod pinecone;
pub mod types;

pub use error::IndexError;
pub use in_memory::InMemoryPassageIndex;
pub use pinecone::PineconeIndex;
pub use types::{
    BoxFuture, FieldCondition, FieldValue, MetadataKeys, PassageIndex, PassageMatch, VectorFilter,
};
