use crate::domain::model::{PortDescriptor, TemplateBinding};
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::validate_quoted_argument;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

pub const DEFAULT_TEMPLATE: &str = "FINS.template";

/// Macro every binding carries: the FINS asyn port name.
pub const PORT_MACRO: &str = "name";

pub fn bind_template(descriptor: &PortDescriptor, template_file: &str) -> TemplateBinding {
    let mut substitutions = BTreeMap::new();
    substitutions.insert(PORT_MACRO.to_string(), descriptor.name.clone());
    TemplateBinding {
        template_file: template_file.to_string(),
        substitutions,
    }
}

fn macro_name_pattern() -> &'static Regex {
    static MACRO_NAME: OnceLock<Regex> = OnceLock::new();
    MACRO_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("macro name pattern is a valid regex")
    })
}

/// Like [`bind_template`] with caller supplied macros. `name` is reserved and
/// macro names are limited to identifier characters.
pub fn bind_template_with(
    descriptor: &PortDescriptor,
    template_file: &str,
    extra_macros: &BTreeMap<String, String>,
) -> Result<TemplateBinding> {
    validate_quoted_argument("templates", template_file)?;

    let mut binding = bind_template(descriptor, template_file);
    for (key, value) in extra_macros {
        if key == PORT_MACRO {
            return Err(BuildError::invalid(
                "macros",
                key,
                format!("'{}' is set from the port name and cannot be overridden", PORT_MACRO),
            ));
        }
        if !macro_name_pattern().is_match(key) {
            return Err(BuildError::invalid(
                "macros",
                key,
                "Macro names may only contain letters, digits and underscores",
            ));
        }
        binding.substitutions.insert(key.clone(), value.clone());
    }
    Ok(binding)
}

/// Quotes a value for a substitutions row.
fn quote_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Renders bindings as an EPICS substitutions file, one block per template
/// in first-seen order. Macros missing from a row are written as empty strings.
pub fn render_substitutions(bindings: &[TemplateBinding]) -> String {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&TemplateBinding>> = BTreeMap::new();
    for binding in bindings {
        let file = binding.template_file.as_str();
        if !groups.contains_key(file) {
            order.push(file);
        }
        groups.entry(file).or_default().push(binding);
    }

    let mut out = String::new();
    for file in order {
        let rows = &groups[file];
        let macros: BTreeSet<&str> = rows
            .iter()
            .flat_map(|b| b.substitutions.keys().map(String::as_str))
            .collect();
        let header: Vec<&str> = macros.iter().copied().collect();

        out.push_str(&format!("file {}\n{{\n", quote_value(file)));
        out.push_str(&format!("pattern {{ {} }}\n", header.join(", ")));
        for row in rows {
            let values: Vec<String> = header
                .iter()
                .map(|m| quote_value(row.substitutions.get(*m).map(String::as_str).unwrap_or("")))
                .collect();
            out.push_str(&format!("{{ {} }}\n", values.join(", ")));
        }
        out.push_str("}\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PortKind;

    fn plc(name: &str) -> PortDescriptor {
        PortDescriptor::new(
            name,
            PortKind::Udp {
                address: "10.0.0.1".into(),
            },
        )
    }

    #[test]
    fn test_binding_has_name_macro() {
        let binding = bind_template(&plc("PLC1"), DEFAULT_TEMPLATE);
        assert_eq!(binding.template_file, "FINS.template");
        assert_eq!(binding.substitutions.get("name").map(String::as_str), Some("PLC1"));
    }

    #[test]
    fn test_name_macro_cannot_be_overridden() {
        let mut extra = BTreeMap::new();
        extra.insert("name".to_string(), "OTHER".to_string());
        assert!(bind_template_with(&plc("PLC1"), DEFAULT_TEMPLATE, &extra).is_err());
    }

    #[test]
    fn test_macro_names_must_be_identifiers() {
        for bad in ["BAD KEY, X", "", "1ST", "P{}"] {
            let mut extra = BTreeMap::new();
            extra.insert(bad.to_string(), "v".to_string());
            assert!(
                matches!(
                    bind_template_with(&plc("PLC1"), DEFAULT_TEMPLATE, &extra),
                    Err(BuildError::InvalidArgument { .. })
                ),
                "accepted macro name {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_template_file_cannot_break_header() {
        let extra = BTreeMap::new();
        assert!(bind_template_with(&plc("PLC1"), "my \"file\".template", &extra).is_err());
    }

    #[test]
    fn test_values_are_escaped() {
        let mut extra = BTreeMap::new();
        extra.insert("DESC".to_string(), r#"a "b" c\d"#.to_string());
        let binding = bind_template_with(&plc("PLC1"), DEFAULT_TEMPLATE, &extra).unwrap();

        let text = render_substitutions(&[binding]);
        assert!(text.contains("pattern { DESC, name }\n"));
        assert!(text.contains(r#"{ "a \"b\" c\\d", "PLC1" }"#));
    }

    #[test]
    fn test_render_groups_by_template() {
        let mut extra = BTreeMap::new();
        extra.insert("P".to_string(), "BL01:".to_string());
        let a = bind_template_with(&plc("PLC1"), DEFAULT_TEMPLATE, &extra).unwrap();
        let b = bind_template(&plc("PLC2"), DEFAULT_TEMPLATE);
        let c = bind_template(&plc("PLC1"), "status.db");

        let text = render_substitutions(&[a, b, c]);
        let expected = "file \"FINS.template\"\n{\n\
pattern { P, name }\n\
{ \"BL01:\", \"PLC1\" }\n\
{ \"\", \"PLC2\" }\n\
}\n\
file \"status.db\"\n{\n\
pattern { name }\n\
{ \"PLC1\" }\n\
}\n";
        assert_eq!(text, expected);
    }
}
