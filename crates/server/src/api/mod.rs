pub mod errors;
mod extractors;
mod handlers;
mod router;

pub use router::build_router;
