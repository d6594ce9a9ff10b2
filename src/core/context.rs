use crate::core::modules::ModuleRegistry;
use crate::core::simulation::SimulationRules;
use crate::core::templates;
use crate::domain::model::{DriverModule, LowerPort, PortDescriptor, PortKind, TemplateBinding};
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::validate_quoted_argument;
use std::collections::{BTreeMap, HashSet};

/// Module instantiated by every FINS port when declared with auto-instantiate.
pub const FINS_MODULE: &str = "FINS";

/// Highest node number `finsNETInit` accepts.
pub const MAX_FINS_NODE: u8 = 254;

/// Registry for one build. Ports, lower ports and modules are declared once
/// and read back during emission; nothing is shared between contexts.
#[derive(Debug)]
pub struct BuildContext {
    ports: Vec<PortDescriptor>,
    lower_ports: Vec<LowerPort>,
    port_names: HashSet<String>,
    modules: ModuleRegistry,
    rules: SimulationRules,
    simulation_enabled: bool,
    bindings: Vec<TemplateBinding>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    pub fn new() -> Self {
        Self::with_rules(SimulationRules::default())
    }

    pub fn with_rules(rules: SimulationRules) -> Self {
        Self {
            ports: Vec::new(),
            lower_ports: Vec::new(),
            port_names: HashSet::new(),
            modules: ModuleRegistry::new(),
            rules,
            simulation_enabled: true,
            bindings: Vec::new(),
        }
    }

    /// A context with the asyn and FINS modules already declared.
    pub fn with_fins_support() -> Result<Self> {
        let mut context = Self::new();
        context.modules.add(DriverModule::asyn())?;
        context.modules.add(DriverModule::fins())?;
        Ok(context)
    }

    /// When disabled, simulation addresses are recorded but never applied.
    pub fn set_simulation_enabled(&mut self, enabled: bool) {
        self.simulation_enabled = enabled;
    }

    pub fn simulation_enabled(&self) -> bool {
        self.simulation_enabled
    }

    pub fn register_lower_port(&mut self, name: &str, description: Option<&str>) -> Result<LowerPort> {
        validate_quoted_argument("lower_port.name", name)?;
        self.claim_name(name)?;

        let port = LowerPort {
            name: name.to_string(),
            description: description.map(str::to_string),
        };
        tracing::debug!("Registered lower asyn port '{}'", name);
        self.lower_ports.push(port.clone());
        Ok(port)
    }

    pub fn create_udp_port(
        &mut self,
        name: &str,
        address: &str,
        simulation_address: Option<&str>,
    ) -> Result<PortDescriptor> {
        validate_quoted_argument("port.address", address)?;
        let descriptor = PortDescriptor {
            name: name.to_string(),
            kind: PortKind::Udp {
                address: address.to_string(),
            },
            simulation_address: simulation_address.map(str::to_string),
        };
        self.register(descriptor)
    }

    pub fn create_tcp_port(
        &mut self,
        name: &str,
        address: &str,
        simulation_address: Option<&str>,
    ) -> Result<PortDescriptor> {
        validate_quoted_argument("port.address", address)?;
        let descriptor = PortDescriptor {
            name: name.to_string(),
            kind: PortKind::Tcp {
                address: address.to_string(),
            },
            simulation_address: simulation_address.map(str::to_string),
        };
        self.register(descriptor)
    }

    pub fn create_hostlink_port(&mut self, name: &str, lower_port: &str) -> Result<PortDescriptor> {
        validate_quoted_argument("port.lower_port", lower_port)?;
        let descriptor = PortDescriptor::new(
            name,
            PortKind::Hostlink {
                lower_port: lower_port.to_string(),
            },
        );
        self.register(descriptor)
    }

    /// Hostlink driver that owns the serial device itself (`finsHostlinkInit`).
    pub fn create_hostlink_direct_port(&mut self, name: &str, device: &str) -> Result<PortDescriptor> {
        validate_quoted_argument("port.device", device)?;
        let descriptor = PortDescriptor::new(
            name,
            PortKind::HostlinkDirect {
                device: device.to_string(),
            },
        );
        self.register(descriptor)
    }

    /// FINS network port on a registered lower asyn port (`finsNETInit`).
    pub fn create_net_port(&mut self, name: &str, lower_port: &str, node: u8) -> Result<PortDescriptor> {
        validate_quoted_argument("port.lower_port", lower_port)?;
        if node > MAX_FINS_NODE {
            return Err(BuildError::invalid(
                "port.node",
                &node.to_string(),
                format!("FINS node addresses range from 0 to {}", MAX_FINS_NODE),
            ));
        }
        let descriptor = PortDescriptor::new(
            name,
            PortKind::Net {
                lower_port: lower_port.to_string(),
                node,
            },
        );
        self.register(descriptor)
    }

    pub fn create_sim_port(&mut self, name: &str) -> Result<PortDescriptor> {
        self.register(PortDescriptor::new(name, PortKind::Sim))
    }

    fn register(&mut self, descriptor: PortDescriptor) -> Result<PortDescriptor> {
        validate_quoted_argument("port.name", &descriptor.name)?;
        if let Some(sim) = descriptor.simulation_address.as_deref() {
            if !sim.trim().is_empty() {
                validate_quoted_argument("port.simulation", sim)?;
                if !self.rules.has_rule(descriptor.kind.tag()) {
                    tracing::warn!(
                        "No simulation rule for {} port '{}', simulation address ignored",
                        descriptor.kind.tag(),
                        descriptor.name
                    );
                }
            }
        }
        if self.port_names.contains(&descriptor.name) {
            return Err(BuildError::DuplicateName {
                name: descriptor.name,
            });
        }

        let active = if self.simulation_enabled {
            let substitution = self.rules.apply(descriptor);
            if substitution.is_replaced() {
                tracing::debug!("Simulation rule replaced the declared port");
            }
            substitution.into_descriptor()
        } else {
            descriptor
        };

        // checks run on the active descriptor, a rule may have produced new values
        validate_quoted_argument("port.name", &active.name)?;
        if let Some(address) = active.address() {
            validate_quoted_argument("port.address", address)?;
        }
        if let Some(lower_port) = active.lower_port() {
            if !self.lower_ports.iter().any(|p| p.name == lower_port) {
                return Err(BuildError::UnresolvedReference {
                    name: active.name.clone(),
                    reference: lower_port.to_string(),
                });
            }
        }
        self.claim_name(&active.name)?;

        tracing::debug!("Registered {} port '{}'", active.kind.tag(), active.name);
        self.ports.push(active.clone());
        if self.modules.auto_instantiate(FINS_MODULE)? {
            tracing::debug!("Module '{}' pulled in by port '{}'", FINS_MODULE, active.name);
        }
        Ok(active)
    }

    fn claim_name(&mut self, name: &str) -> Result<()> {
        if !self.port_names.insert(name.to_string()) {
            return Err(BuildError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub fn declare_module(
        &mut self,
        id: &str,
        dependencies: &[String],
        libraries: &[String],
        database_definitions: &[String],
        auto_instantiate: bool,
    ) -> Result<DriverModule> {
        let module = self.modules.declare(
            id,
            dependencies,
            libraries,
            database_definitions,
            auto_instantiate,
        )?;
        // FINS declared after the first port still gets linked
        if module.id == FINS_MODULE && !self.ports.is_empty() {
            self.modules.auto_instantiate(FINS_MODULE)?;
        }
        Ok(module)
    }

    pub fn instantiate_module(&mut self, id: &str) -> Result<()> {
        self.modules.instantiate(id)
    }

    /// Binds a record template to a registered FINS port and keeps the
    /// binding for the substitutions file. An unknown port is reported
    /// against the template that asked for it.
    pub fn bind_template(
        &mut self,
        port_name: &str,
        template_file: &str,
        extra_macros: &BTreeMap<String, String>,
    ) -> Result<TemplateBinding> {
        let descriptor = self
            .port(port_name)
            .ok_or_else(|| BuildError::UnresolvedReference {
                name: template_file.to_string(),
                reference: port_name.to_string(),
            })?;
        let binding = templates::bind_template_with(descriptor, template_file, extra_macros)?;
        self.bindings.push(binding.clone());
        Ok(binding)
    }

    pub fn port(&self, name: &str) -> Option<&PortDescriptor> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn lower_ports(&self) -> &[LowerPort] {
        &self.lower_ports
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn bindings(&self) -> &[TemplateBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PortKindTag;

    #[test]
    fn test_duplicate_port_not_added() {
        let mut ctx = BuildContext::new();
        ctx.create_udp_port("PLC1", "192.168.0.1", None).unwrap();
        let err = ctx.create_udp_port("PLC1", "192.168.0.2", None).unwrap_err();

        assert!(matches!(err, BuildError::DuplicateName { .. }));
        assert_eq!(ctx.ports().len(), 1);
        assert_eq!(ctx.ports()[0].address(), Some("192.168.0.1"));
    }

    #[test]
    fn test_lower_ports_share_namespace() {
        let mut ctx = BuildContext::new();
        ctx.register_lower_port("COM1", None).unwrap();
        assert!(ctx.create_udp_port("COM1", "10.0.0.1", None).is_err());
        assert!(ctx.ports().is_empty());
    }

    #[test]
    fn test_hostlink_requires_lower_port() {
        let mut ctx = BuildContext::new();
        let err = ctx.create_hostlink_port("PLC2", "COM1").unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedReference { ref name, ref reference } if name == "PLC2" && reference == "COM1"
        ));
        assert!(ctx.ports().is_empty());
    }

    #[test]
    fn test_hostlink_cannot_sit_on_fins_port() {
        let mut ctx = BuildContext::new();
        ctx.create_udp_port("PLC1", "10.0.0.1", None).unwrap();
        assert!(ctx.create_hostlink_port("PLC2", "PLC1").is_err());
    }

    #[test]
    fn test_invalid_arguments() {
        let mut ctx = BuildContext::new();
        assert!(matches!(
            ctx.create_udp_port("", "10.0.0.1", None),
            Err(BuildError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ctx.create_udp_port("PLC1", " ", None),
            Err(BuildError::InvalidArgument { .. })
        ));
        assert!(matches!(
            ctx.create_udp_port("PLC1", "10.0.0.1", Some("bad addr")),
            Err(BuildError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_simulation_disabled_keeps_real_address() {
        let mut ctx = BuildContext::new();
        ctx.set_simulation_enabled(false);
        let d = ctx
            .create_udp_port("PLC1", "192.168.0.1", Some("127.0.0.1"))
            .unwrap();
        assert_eq!(d.address(), Some("192.168.0.1"));
    }

    #[test]
    fn test_fins_module_auto_instantiated() {
        let mut ctx = BuildContext::with_fins_support().unwrap();
        assert!(!ctx.modules().is_instantiated(FINS_MODULE));
        ctx.create_sim_port("SIM1").unwrap();
        assert!(ctx.modules().is_instantiated(FINS_MODULE));
    }

    #[test]
    fn test_template_requires_known_port() {
        let mut ctx = BuildContext::new();
        let err = ctx
            .bind_template("PLC9", "FINS.template", &BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "'FINS.template' references undeclared 'PLC9'");
    }

    #[test]
    fn test_rule_output_must_resolve_lower_port() {
        let mut rules = SimulationRules::empty();
        rules.register(PortKindTag::Udp, |real, sim| {
            Some(PortDescriptor::new(
                real.name.clone(),
                PortKind::Hostlink {
                    lower_port: sim.to_string(),
                },
            ))
        });

        let mut ctx = BuildContext::with_rules(rules);
        let err = ctx
            .create_udp_port("PLC1", "10.0.0.1", Some("NOPE"))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnresolvedReference { ref name, ref reference } if name == "PLC1" && reference == "NOPE"
        ));
        assert!(ctx.ports().is_empty());
        assert!(ctx.port("PLC1").is_none());

        // the name was not claimed by the failed attempt
        ctx.register_lower_port("COM1", None).unwrap();
        let swapped = ctx.create_udp_port("PLC1", "10.0.0.1", Some("COM1")).unwrap();
        assert_eq!(swapped.lower_port(), Some("COM1"));
    }

    #[test]
    fn test_net_port_checks_lower_port_and_node() {
        let mut ctx = BuildContext::new();
        assert!(matches!(
            ctx.create_net_port("PLC4", "ETH1", 1),
            Err(BuildError::UnresolvedReference { .. })
        ));

        ctx.register_lower_port("ETH1", Some("FINS network interface")).unwrap();
        assert!(matches!(
            ctx.create_net_port("PLC4", "ETH1", 255),
            Err(BuildError::InvalidArgument { .. })
        ));

        let port = ctx.create_net_port("PLC4", "ETH1", 12).unwrap();
        assert_eq!(
            port.kind,
            PortKind::Net {
                lower_port: "ETH1".into(),
                node: 12
            }
        );
    }

    #[test]
    fn test_direct_hostlink_needs_no_lower_port() {
        let mut ctx = BuildContext::new();
        let port = ctx.create_hostlink_direct_port("PLC5", "/dev/ttyS0").unwrap();
        assert_eq!(port.address(), Some("/dev/ttyS0"));
        assert!(ctx.create_hostlink_direct_port("PLC6", "COM 1").is_err());
    }
}
