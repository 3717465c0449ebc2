pub mod csv_file;
pub mod error;
pub mod netflix;
pub mod plex;
pub mod progress;
pub mod traits;

pub use csv_file::CsvFileSource;
pub use error::SourceError;
pub use netflix::NetflixSource;
pub use plex::PlexSource;
pub use progress::ProgressTracker;
pub use traits::{source_for, EventSource};
