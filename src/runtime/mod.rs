//! Runtime support for generated programs
//!
//! Everything under this module depends on `std` only: the sources are
//! embedded verbatim as `mod bolt` into every program generated from a
//! Boltfile, so they must compile with a bare `rustc`. The layout of the
//! embedded module mirrors this one (see `transpile::codegen`).

pub mod command;
pub mod context;
pub mod ident;
pub mod registry;

pub use command::Response;
pub use context::{quote, Context, EnvFlag, Settings};
pub use ident::normalize_id;
pub use registry::{run_init, Registry, TaskOutcome};

/// Names a Boltfile gets from its automatic `use bolt::prelude::*;`
pub mod prelude {
    pub use super::{quote, Context, EnvFlag, Response, Settings};
}
