pub mod integrators;
pub mod math;
pub mod orbit;
