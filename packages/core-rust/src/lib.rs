//! `hashmodel` core: storage key scheme, record identifiers, and the mapping
//! between model instances and flat hash payloads.
//!
//! Nothing here performs I/O; the async engine lives in the `hashmodel` crate.

pub mod filter;
pub mod id;
pub mod key;
pub mod mapper;
pub mod model;

pub use filter::Filters;
pub use id::{IdError, IdGenerator, RecordId, TimeOrderedIds};
pub use key::KeyScheme;
pub use mapper::{Fields, MapError, RecordMapper, DEFAULT_ID_FIELD};
pub use model::Model;
