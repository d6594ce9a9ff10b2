use crate::domain::model::{DriverModule, LinkManifest};
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::validate_non_empty_string;
use std::collections::{HashMap, HashSet};

/// Declared driver modules plus the ones this build actually links.
///
/// Only direct dependency edges are stored; [`ModuleRegistry::link_manifest`]
/// walks them.
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    declared: Vec<DriverModule>,
    index: HashMap<String, usize>,
    instantiated: Vec<String>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        &mut self,
        id: &str,
        dependencies: &[String],
        libraries: &[String],
        database_definitions: &[String],
        auto_instantiate: bool,
    ) -> Result<DriverModule> {
        validate_non_empty_string("module.id", id)?;
        for dep in dependencies {
            validate_non_empty_string("module.dependencies", dep)?;
        }
        if self.index.contains_key(id) {
            return Err(BuildError::DuplicateName {
                name: id.to_string(),
            });
        }

        let mut deps: Vec<String> = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !deps.contains(dep) {
                deps.push(dep.clone());
            }
        }

        let module = DriverModule {
            id: id.to_string(),
            dependencies: deps,
            libraries: libraries.to_vec(),
            database_definitions: database_definitions.to_vec(),
            auto_instantiate,
        };
        tracing::debug!(
            "Declared module '{}' (deps: {:?}, auto: {})",
            module.id,
            module.dependencies,
            module.auto_instantiate
        );

        self.index.insert(module.id.clone(), self.declared.len());
        self.declared.push(module.clone());
        Ok(module)
    }

    pub fn add(&mut self, module: DriverModule) -> Result<DriverModule> {
        self.declare(
            &module.id,
            &module.dependencies,
            &module.libraries,
            &module.database_definitions,
            module.auto_instantiate,
        )
    }

    pub fn get(&self, id: &str) -> Option<&DriverModule> {
        self.index.get(id).map(|&i| &self.declared[i])
    }

    pub fn declared(&self) -> &[DriverModule] {
        &self.declared
    }

    pub fn instantiated(&self) -> &[String] {
        &self.instantiated
    }

    pub fn is_instantiated(&self, id: &str) -> bool {
        self.instantiated.iter().any(|m| m == id)
    }

    pub fn instantiate(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(BuildError::UnresolvedReference {
                name: "module instantiation".to_string(),
                reference: id.to_string(),
            });
        }
        if !self.is_instantiated(id) {
            tracing::debug!("Instantiating module '{}'", id);
            self.instantiated.push(id.to_string());
        }
        Ok(())
    }

    /// Instantiates `id` only if it is declared with `auto_instantiate`.
    pub fn auto_instantiate(&mut self, id: &str) -> Result<bool> {
        match self.get(id) {
            Some(module) if module.auto_instantiate => {
                self.instantiate(id)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Link order of every instantiated module and its declared
    /// dependencies, dependencies first.
    pub fn link_manifest(&self) -> Result<LinkManifest> {
        let order = resolve_link_order(self, &self.instantiated)?;

        let mut manifest = LinkManifest::default();
        for entry in order {
            match self.get(&entry) {
                Some(module) => {
                    extend_unique(&mut manifest.libraries, &module.libraries);
                    extend_unique(
                        &mut manifest.database_definitions,
                        &module.database_definitions,
                    );
                    manifest.modules.push(entry);
                }
                None => manifest.external.push(entry),
            }
        }
        Ok(manifest)
    }
}

fn extend_unique(target: &mut Vec<String>, items: &[String]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// Depth-first topological order starting from `roots`. Ids that are not
/// declared in `registry` are kept as leaves.
pub fn resolve_link_order(registry: &ModuleRegistry, roots: &[String]) -> Result<Vec<String>> {
    let mut done: HashSet<String> = HashSet::new();
    let mut path: Vec<String> = Vec::new();
    let mut order = Vec::new();

    for root in roots {
        visit(registry, root, &mut path, &mut done, &mut order)?;
    }
    Ok(order)
}

fn visit(
    registry: &ModuleRegistry,
    id: &str,
    path: &mut Vec<String>,
    done: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> Result<()> {
    if done.contains(id) {
        return Ok(());
    }
    if let Some(pos) = path.iter().position(|p| p == id) {
        let mut cycle = path[pos..].to_vec();
        cycle.push(id.to_string());
        return Err(BuildError::CyclicDependency { cycle });
    }

    path.push(id.to_string());
    if let Some(module) = registry.get(id) {
        for dep in &module.dependencies {
            visit(registry, dep, path, done, order)?;
        }
    }
    path.pop();

    done.insert(id.to_string());
    order.push(id.to_string());
    Ok(())
}
