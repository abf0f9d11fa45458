pub mod public;
mod router;
mod ws;

pub use router::router;
