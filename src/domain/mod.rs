// Domain layer: models and ports (interfaces) shared by the APS clients and the HTTP layer.

pub mod model;
pub mod ports;
