pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalSink, toml_config::BuildConfig};
pub use crate::core::{
    build::BuildEngine,
    context::BuildContext,
    emitter::{emit_init_commands, emit_script},
    simulation::SimulationRules,
    templates::{bind_template, render_substitutions},
};
pub use crate::domain::model::{DriverModule, PortDescriptor, PortKind, TemplateBinding};
pub use crate::utils::error::{BuildError, Result};
