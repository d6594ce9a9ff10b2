use crate::domain::model::{PortDescriptor, PortKind, PortKindTag};
use std::collections::HashMap;
use std::fmt;

/// Builds the stand-in descriptor for a port given its simulation address.
/// `None` means the rule opts out and the real descriptor stays active.
pub type SimulationFactory = Box<dyn Fn(&PortDescriptor, &str) -> Option<PortDescriptor>>;

/// Outcome of consulting the rule table for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Substitution {
    Replaced(PortDescriptor),
    Unchanged(PortDescriptor),
}

impl Substitution {
    pub fn into_descriptor(self) -> PortDescriptor {
        match self {
            Substitution::Replaced(d) | Substitution::Unchanged(d) => d,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Substitution::Replaced(_))
    }
}

pub struct SimulationRules {
    rules: HashMap<PortKindTag, SimulationFactory>,
}

impl SimulationRules {
    /// A table with no rules: every descriptor passes through.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, kind: PortKindTag, factory: F)
    where
        F: Fn(&PortDescriptor, &str) -> Option<PortDescriptor> + 'static,
    {
        self.rules.insert(kind, Box::new(factory));
    }

    pub fn has_rule(&self, kind: PortKindTag) -> bool {
        self.rules.contains_key(&kind)
    }

    pub fn apply(&self, descriptor: PortDescriptor) -> Substitution {
        let sim_address = match descriptor.simulation_address.as_deref() {
            Some(addr) if !addr.trim().is_empty() => addr.to_string(),
            _ => return Substitution::Unchanged(descriptor),
        };

        let Some(factory) = self.rules.get(&descriptor.kind.tag()) else {
            return Substitution::Unchanged(descriptor);
        };

        match factory(&descriptor, &sim_address) {
            Some(replacement) => {
                tracing::info!(
                    "Port '{}' redirected to simulation endpoint '{}'",
                    descriptor.name,
                    sim_address
                );
                Substitution::Replaced(replacement)
            }
            None => {
                tracing::debug!("Simulation rule for '{}' opted out", descriptor.name);
                Substitution::Unchanged(descriptor)
            }
        }
    }
}

impl Default for SimulationRules {
    /// UDP and TCP ports are re-pointed at the simulation address.
    fn default() -> Self {
        let mut rules = Self::empty();
        rules.register(PortKindTag::Udp, |real, sim| {
            Some(PortDescriptor::new(
                real.name.clone(),
                PortKind::Udp {
                    address: sim.to_string(),
                },
            ))
        });
        rules.register(PortKindTag::Tcp, |real, sim| {
            Some(PortDescriptor::new(
                real.name.clone(),
                PortKind::Tcp {
                    address: sim.to_string(),
                },
            ))
        });
        rules
    }
}

impl fmt::Debug for SimulationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.rules.keys().collect();
        kinds.sort();
        f.debug_struct("SimulationRules").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn udp(address: &str, sim: Option<&str>) -> PortDescriptor {
        PortDescriptor {
            name: "PLC1".to_string(),
            kind: PortKind::Udp {
                address: address.to_string(),
            },
            simulation_address: sim.map(str::to_string),
        }
    }

    #[test]
    fn test_udp_rule_replaces_address() {
        let rules = SimulationRules::default();
        let result = rules.apply(udp("192.168.0.1", Some("127.0.0.1")));

        assert!(result.is_replaced());
        let descriptor = result.into_descriptor();
        assert_eq!(descriptor.address(), Some("127.0.0.1"));
        assert_eq!(descriptor.simulation_address, None);
    }

    #[test]
    fn test_empty_simulation_address_passes_through() {
        let rules = SimulationRules::default();
        let original = udp("192.168.0.1", Some(""));
        assert_eq!(
            rules.apply(original.clone()),
            Substitution::Unchanged(original)
        );
    }

    #[test]
    fn test_opt_out_keeps_original() {
        let mut rules = SimulationRules::empty();
        rules.register(PortKindTag::Udp, |_, _| None);

        let original = udp("192.168.0.1", Some("127.0.0.1"));
        let result = rules.apply(original.clone());
        assert!(!result.is_replaced());
        assert_eq!(result.into_descriptor(), original);
    }

    #[test]
    fn test_missing_rule_passes_through() {
        let rules = SimulationRules::empty();
        assert!(!rules.has_rule(PortKindTag::Udp));
        assert!(!rules.apply(udp("10.0.0.2", Some("127.0.0.1"))).is_replaced());
    }
}
