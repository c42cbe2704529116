pub mod cleanup;
pub mod preview;
pub mod run;
pub mod status;

pub use cleanup::cleanup;
pub use preview::preview;
pub use run::run_once;
pub use status::status;
