pub mod error;
pub mod serializd;
pub mod tmdb;
pub mod traits;

pub use error::RemoteError;
pub use serializd::SerializdClient;
pub use tmdb::TmdbClient;
pub use traits::{MetadataLookup, ShowCandidate, TrackingService};
