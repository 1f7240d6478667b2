pub mod capture;
pub mod sync;
pub mod trigger;
