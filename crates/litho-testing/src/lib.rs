//! Testing utilities and harness for Litho-RS

pub mod components;
pub mod harness;
pub mod host;
pub mod scheduler;

pub use components::*;
pub use harness::*;
pub use host::*;
pub use scheduler::*;

pub mod prelude {
    pub use crate::components::*;
    pub use crate::harness::*;
    pub use crate::host::*;
    pub use crate::scheduler::*;
}
