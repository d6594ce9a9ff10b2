use crate::core::context::BuildContext;
use crate::core::templates::DEFAULT_TEMPLATE;
use crate::domain::model::{DriverModule, PortKindTag};
use crate::domain::ports::OutputLayout;
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_required_field,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

const TEMPLATE_EXTENSIONS: [&str; 2] = ["template", "db"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub build: BuildSection,
    pub output: Option<OutputConfig>,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub lower_ports: Vec<LowerPortConfig>,
    #[serde(default)]
    pub ports: Vec<PortConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    pub name: String,
    pub description: Option<String>,
    pub simulation: Option<bool>,
    pub default_modules: Option<bool>,
    pub instantiate: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub startup_script: Option<String>,
    pub substitutions: Option<String>,
    pub manifest: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub libraries: Vec<String>,
    #[serde(default)]
    pub database_definitions: Vec<String>,
    #[serde(default)]
    pub auto_instantiate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowerPortConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    pub name: String,
    pub kind: PortKindTag,
    pub address: Option<String>,
    pub lower_port: Option<String>,
    pub device: Option<String>,
    pub node: Option<u8>,
    pub simulation: Option<String>,
    /// Absent means `FINS.template` only; an empty list binds nothing.
    pub templates: Option<Vec<String>>,
    pub macros: Option<BTreeMap<String, String>>,
}

impl BuildConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BuildError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("build.name", &self.build.name)?;

        validate_path("output.startup_script", self.startup_script())?;
        validate_path("output.substitutions", self.substitutions())?;
        validate_path("output.manifest", self.manifest())?;

        for port in &self.ports {
            match port.kind {
                PortKindTag::Udp | PortKindTag::Tcp => {
                    validate_required_field("ports.address", &port.address)?;
                }
                PortKindTag::Hostlink => {
                    validate_required_field("ports.lower_port", &port.lower_port)?;
                }
                PortKindTag::Net => {
                    validate_required_field("ports.lower_port", &port.lower_port)?;
                    validate_required_field("ports.node", &port.node)?;
                }
                PortKindTag::HostlinkDirect => {
                    validate_required_field("ports.device", &port.device)?;
                }
                PortKindTag::Sim => {}
            }
            if port.simulation.is_some() && !matches!(port.kind, PortKindTag::Udp | PortKindTag::Tcp) {
                return Err(BuildError::invalid(
                    "ports.simulation",
                    &port.name,
                    format!("{} ports do not support a simulation address", port.kind),
                ));
            }
            if let Some(templates) = &port.templates {
                validate_file_extensions("ports.templates", templates, &TEMPLATE_EXTENSIONS)?;
            }
        }

        Ok(())
    }

    pub fn simulation_enabled(&self) -> bool {
        self.build.simulation.unwrap_or(true)
    }

    /// Declares everything in file order: modules, lower ports, then FINS
    /// ports with their template bindings.
    pub fn build_context(&self, simulation_override: Option<bool>) -> Result<BuildContext> {
        self.validate_config()?;

        let mut context = BuildContext::new();
        context.set_simulation_enabled(simulation_override.unwrap_or(self.simulation_enabled()));

        if self.build.default_modules.unwrap_or(true) {
            for module in [DriverModule::asyn(), DriverModule::fins()] {
                if !self.modules.iter().any(|m| m.id == module.id) {
                    context.declare_module(
                        &module.id,
                        &module.dependencies,
                        &module.libraries,
                        &module.database_definitions,
                        module.auto_instantiate,
                    )?;
                }
            }
        }
        for module in &self.modules {
            context.declare_module(
                &module.id,
                &module.dependencies,
                &module.libraries,
                &module.database_definitions,
                module.auto_instantiate,
            )?;
        }

        for lower in &self.lower_ports {
            context.register_lower_port(&lower.name, lower.description.as_deref())?;
        }

        for port in &self.ports {
            let simulation = port.simulation.as_deref();
            match port.kind {
                PortKindTag::Udp => {
                    let address = validate_required_field("ports.address", &port.address)?;
                    context.create_udp_port(&port.name, address, simulation)?;
                }
                PortKindTag::Tcp => {
                    let address = validate_required_field("ports.address", &port.address)?;
                    context.create_tcp_port(&port.name, address, simulation)?;
                }
                PortKindTag::Hostlink => {
                    let lower = validate_required_field("ports.lower_port", &port.lower_port)?;
                    context.create_hostlink_port(&port.name, lower)?;
                }
                PortKindTag::Net => {
                    let lower = validate_required_field("ports.lower_port", &port.lower_port)?;
                    let node = validate_required_field("ports.node", &port.node)?;
                    context.create_net_port(&port.name, lower, *node)?;
                }
                PortKindTag::HostlinkDirect => {
                    let device = validate_required_field("ports.device", &port.device)?;
                    context.create_hostlink_direct_port(&port.name, device)?;
                }
                PortKindTag::Sim => {
                    context.create_sim_port(&port.name)?;
                }
            }

            let macros = port.macros.clone().unwrap_or_default();
            match &port.templates {
                Some(templates) => {
                    for template in templates {
                        context.bind_template(&port.name, template, &macros)?;
                    }
                }
                None => {
                    context.bind_template(&port.name, DEFAULT_TEMPLATE, &macros)?;
                }
            }
        }

        for id in self.build.instantiate.iter().flatten() {
            context.instantiate_module(id)?;
        }

        Ok(context)
    }
}

impl OutputLayout for BuildConfig {
    fn startup_script(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.startup_script.as_deref())
            .unwrap_or("fins.cmd")
    }

    fn substitutions(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.substitutions.as_deref())
            .unwrap_or("fins.substitutions")
    }

    fn manifest(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.manifest.as_deref())
            .unwrap_or("fins-manifest.json")
    }
}

impl Validate for BuildConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
