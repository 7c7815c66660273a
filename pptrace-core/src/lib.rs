pub mod demangler;
pub mod filter;
pub mod frame;

pub use demangler::*;
pub use filter::*;
pub use frame::*;
