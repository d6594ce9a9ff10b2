use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind tag of a FINS port, used to key the simulation rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKindTag {
    Udp,
    Tcp,
    Hostlink,
    HostlinkDirect,
    Net,
    Sim,
}

impl fmt::Display for PortKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortKindTag::Udp => "udp",
            PortKindTag::Tcp => "tcp",
            PortKindTag::Hostlink => "hostlink",
            PortKindTag::HostlinkDirect => "hostlink_direct",
            PortKindTag::Net => "net",
            PortKindTag::Sim => "sim",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// FINS over UDP, `address` is the PLC host or IP.
    Udp { address: String },
    /// FINS over TCP.
    Tcp { address: String },
    /// FINS in a Hostlink wrapper over an already registered serial port.
    Hostlink { lower_port: String },
    /// Hostlink driver that opens the serial device itself.
    HostlinkDirect { device: String },
    /// FINS network layer on a registered asyn port, with the local node number.
    Net { lower_port: String, node: u8 },
    /// Software simulated PLC, no transport.
    Sim,
}

impl PortKind {
    pub fn tag(&self) -> PortKindTag {
        match self {
            PortKind::Udp { .. } => PortKindTag::Udp,
            PortKind::Tcp { .. } => PortKindTag::Tcp,
            PortKind::Hostlink { .. } => PortKindTag::Hostlink,
            PortKind::HostlinkDirect { .. } => PortKindTag::HostlinkDirect,
            PortKind::Net { .. } => PortKindTag::Net,
            PortKind::Sim => PortKindTag::Sim,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: String,
    pub kind: PortKind,
    pub simulation_address: Option<String>,
}

impl PortDescriptor {
    pub fn new(name: impl Into<String>, kind: PortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            simulation_address: None,
        }
    }

    /// The transport address the emitted commands will use, if the kind has one.
    pub fn address(&self) -> Option<&str> {
        match &self.kind {
            PortKind::Udp { address } | PortKind::Tcp { address } => Some(address),
            PortKind::Hostlink { lower_port } | PortKind::Net { lower_port, .. } => Some(lower_port),
            PortKind::HostlinkDirect { device } => Some(device),
            PortKind::Sim => None,
        }
    }

    /// The asyn port this one is layered on, which must already be registered.
    pub fn lower_port(&self) -> Option<&str> {
        match &self.kind {
            PortKind::Hostlink { lower_port } | PortKind::Net { lower_port, .. } => Some(lower_port),
            _ => None,
        }
    }
}

/// An asyn port owned by another module (serial line, terminal server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowerPort {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverModule {
    pub id: String,
    pub dependencies: Vec<String>,
    pub libraries: Vec<String>,
    pub database_definitions: Vec<String>,
    pub auto_instantiate: bool,
}

impl DriverModule {
    /// The FINS driver support module.
    pub fn fins() -> Self {
        Self {
            id: "FINS".to_string(),
            dependencies: vec!["asyn".to_string()],
            libraries: vec!["FINS".to_string()],
            database_definitions: vec!["FINS".to_string()],
            auto_instantiate: true,
        }
    }

    pub fn asyn() -> Self {
        Self {
            id: "asyn".to_string(),
            dependencies: Vec::new(),
            libraries: vec!["asyn".to_string()],
            database_definitions: vec!["asyn".to_string()],
            auto_instantiate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBinding {
    pub template_file: String,
    pub substitutions: BTreeMap<String, String>,
}

/// Link metadata for the external build tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkManifest {
    pub modules: Vec<String>,
    pub external: Vec<String>,
    pub libraries: Vec<String>,
    pub database_definitions: Vec<String>,
}

/// Everything one build pass produces.
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    pub startup_script: String,
    pub substitutions: String,
    pub manifest: LinkManifest,
}
