pub mod reading;
pub mod sensor;

pub use reading::*;
pub use sensor::*;
