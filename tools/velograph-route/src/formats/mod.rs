//! Binary dataset formats
//!
//! A dataset is a directory of six big-endian record files. Every decoder
//! works over any `AsRef<[u8]>` buffer and decodes records on access.

pub mod attributes;
pub mod buffer;
pub mod edges;
pub mod nodes;
pub mod sectors;

pub use attributes::{Attribute, AttributeSet};
pub use buffer::Buffer;
pub use edges::{GraphEdges, ProfileKind};
pub use nodes::GraphNodes;
pub use sectors::{GraphSectors, Sector};
