mod loader;
mod raw;

pub use loader::{load_catalog, load_credentials, load_credentials_or_default, supported_versions};
