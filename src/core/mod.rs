pub mod build;
pub mod context;
pub mod emitter;
pub mod modules;
pub mod simulation;
pub mod templates;

pub use crate::domain::model::{
    BuildArtifacts, DriverModule, LinkManifest, LowerPort, PortDescriptor, PortKind, PortKindTag,
    TemplateBinding,
};
pub use crate::domain::ports::{OutputLayout, ScriptSink};
pub use crate::utils::error::Result;
