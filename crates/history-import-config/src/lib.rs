pub mod config;
pub mod credentials;
pub mod lists;
pub mod paths;

pub use config::{Config, ImportDefaults, SerializdConfig, TmdbConfig};
pub use credentials::CredentialStore;
pub use lists::{parse_exclusion_list, parse_override_map, read_exclusion_file, read_override_file};
pub use paths::PathManager;
