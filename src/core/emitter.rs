//! Boot-script generation.
//!
//! Every function here is pure: the same descriptor always yields the same
//! lines. Running the lines is the IOC shell's job.

use crate::core::context::BuildContext;
use crate::domain::model::{PortDescriptor, PortKind};

pub fn emit_init_commands(descriptor: &PortDescriptor) -> Vec<String> {
    let name = &descriptor.name;
    match &descriptor.kind {
        PortKind::Udp { address } => vec![
            "# finsUDPInit(asyn_port, ip_addr)".to_string(),
            format!("finsUDPInit(\"{}\", \"{}\")", name, address),
        ],
        PortKind::Tcp { address } => vec![
            "# finsTCPInit(asyn_port, ip_addr)".to_string(),
            format!("finsTCPInit(\"{}\", \"{}\")", name, address),
        ],
        // The interpose layer must exist before finsDEVInit attaches to it.
        PortKind::Hostlink { lower_port } => vec![
            "# HostlinkInterposeInit(asyn_port)".to_string(),
            format!("HostlinkInterposeInit(\"{}\")", lower_port),
            "# finsDEVInit(FINS_port_name, asyn_port)".to_string(),
            format!("finsDEVInit(\"{}\", \"{}\")", name, lower_port),
        ],
        PortKind::HostlinkDirect { device } => vec![
            "# finsHostlinkInit(asyn_port, serial_device)".to_string(),
            format!("finsHostlinkInit(\"{}\", \"{}\")", name, device),
        ],
        PortKind::Net { lower_port, node } => vec![
            "# finsNETInit(FINS_port_name, asyn_port, local_node)".to_string(),
            format!("finsNETInit(\"{}\", \"{}\", {})", name, lower_port, node),
        ],
        PortKind::Sim => vec![
            "# finsSIMInit(asyn_port)".to_string(),
            format!("finsSIMInit(\"{}\")", name),
        ],
    }
}

/// Commands for every port in the context, in registration order.
pub fn emit_script(context: &BuildContext) -> String {
    let mut script = String::new();
    for descriptor in context.ports() {
        for line in emit_init_commands(descriptor) {
            script.push_str(&line);
            script.push('\n');
        }
    }
    script
}
