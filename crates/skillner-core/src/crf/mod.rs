pub mod model;

pub use model::{CrfNetwork, CrfParams};
