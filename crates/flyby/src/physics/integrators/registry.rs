//! Name-based lookup of integrators
//!
//! Each integrator describes itself (canonical name, aliases, convergence
//! order) and the registry builds its lookup table from that metadata, so the
//! configuration file and the command line can select one by name.

use super::Integrator;
use std::collections::{BTreeSet, HashMap};

pub struct IntegratorRegistry {
    /// Maps canonical names and aliases to integrator instances
    integrators: HashMap<String, Box<dyn Integrator>>,
}

impl IntegratorRegistry {
    pub fn new() -> Self {
        Self {
            integrators: HashMap::new(),
        }
    }

    /// Registers every integrator that ships with the crate.
    pub fn with_standard_integrators(mut self) -> Self {
        use super::{RungeKuttaFourthOrder, VelocityVerlet};

        self.register_integrator(Box::new(RungeKuttaFourthOrder));
        self.register_integrator(Box::new(VelocityVerlet));
        self
    }

    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.register_integrator(integrator);
        self
    }

    pub fn register_integrator(&mut self, integrator: Box<dyn Integrator>) {
        for alias in integrator.aliases() {
            self.integrators
                .insert(alias.to_string(), integrator.clone_box());
        }
        self.integrators
            .insert(integrator.name().to_string(), integrator);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Integrator>, String> {
        self.integrators
            .get(name)
            .map(|integrator| integrator.clone_box())
            .ok_or_else(|| {
                let alias_names: Vec<String> =
                    self.list_aliases().into_iter().map(|(alias, _)| alias).collect();
                format!(
                    "Unknown integrator: '{}'. Available integrators: {}. Aliases: {}",
                    name,
                    self.list_available().join(", "),
                    alias_names.join(", ")
                )
            })
    }

    /// Canonical names, sorted
    pub fn list_available(&self) -> Vec<String> {
        self.integrators
            .values()
            .map(|integrator| integrator.name().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// `(alias, canonical name)` pairs, sorted by alias
    pub fn list_aliases(&self) -> Vec<(String, String)> {
        let mut aliases: Vec<(String, String)> = self
            .integrators
            .iter()
            .filter(|(key, integrator)| key.as_str() != integrator.name())
            .map(|(key, integrator)| (key.clone(), integrator.name().to_string()))
            .collect();

        aliases.sort();
        aliases
    }
}

impl Default for IntegratorRegistry {
    fn default() -> Self {
        Self::new().with_standard_integrators()
    }
}
