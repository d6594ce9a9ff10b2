// Domain layer: port/module models and the output ports the engine writes through.

pub mod model;
pub mod ports;
