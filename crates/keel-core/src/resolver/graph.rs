use std::collections::HashMap;

use crate::module::descriptor::ModuleDescriptor;
use crate::resolver::error::ResolutionError;

/// Directed dependency graph over the composite's modules.
///
/// Nodes are module identities in registration order (plugin order, then
/// module order within a plugin); an edge `consumer -> provider` records
/// that the provider must complete each phase before the consumer.
pub struct DependencyGraph {
    /// Module identities, indexed in registration order
    nodes: Vec<String>,
    /// Adjacency list: node index -> indices of the providers it depends on
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build the graph from the exposed/consumed interface sets of the
    /// given descriptors (flattened in registration order).
    ///
    /// A consumed interface with no provider anywhere in the composite is
    /// an error only when the dependency is required; optional dependencies
    /// resolve to "not present" without contributing an edge.
    pub fn build(modules: &[ModuleDescriptor]) -> Result<Self, ResolutionError> {
        let nodes: Vec<String> = modules.iter().map(|m| m.identity()).collect();

        // Interface -> exposing module indices, in registration order
        let mut providers: HashMap<&crate::module::service::InterfaceRef, Vec<usize>> =
            HashMap::new();
        for (idx, module) in modules.iter().enumerate() {
            for interface in module.exposes() {
                providers.entry(interface).or_default().push(idx);
            }
        }

        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); modules.len()];
        for (idx, module) in modules.iter().enumerate() {
            for dep in module.consumes() {
                match providers.get(&dep.interface) {
                    Some(exposing) => {
                        for &provider in exposing {
                            // A module satisfies its own exposure; no self-edge
                            if provider != idx && !edges[idx].contains(&provider) {
                                edges[idx].push(provider);
                            }
                        }
                    }
                    None if dep.required => {
                        return Err(ResolutionError::MissingProvider {
                            consumer: nodes[idx].clone(),
                            interface: dep.interface.clone(),
                        });
                    }
                    None => {}
                }
            }
        }

        Ok(Self { nodes, edges })
    }

    /// Number of modules in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Module identities in registration order.
    pub fn identities(&self) -> &[String] {
        &self.nodes
    }

    /// Identities of the providers the given module depends on.
    pub fn dependencies_of(&self, identity: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .position(|n| n == identity)
            .map(|idx| {
                self.edges[idx]
                    .iter()
                    .map(|&p| self.nodes[p].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Produce a topologically sorted order (as indices into the
    /// registration-ordered descriptor list): providers strictly before
    /// consumers, with mutually independent modules kept in registration
    /// order for reproducible composition.
    pub fn topological_order(&self) -> Result<Vec<usize>, ResolutionError> {
        let mut visited = vec![false; self.nodes.len()];
        let mut on_stack = vec![false; self.nodes.len()];
        let mut path: Vec<usize> = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for idx in 0..self.nodes.len() {
            if !visited[idx] {
                self.visit(idx, &mut visited, &mut on_stack, &mut path, &mut order)?;
            }
        }

        Ok(order)
    }

    /// DFS for topological sort; nodes are appended after their providers.
    fn visit(
        &self,
        idx: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        path: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), ResolutionError> {
        if on_stack[idx] {
            // Reconstruct the full cycle path from the DFS stack
            let start = path.iter().position(|&n| n == idx).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..]
                .iter()
                .map(|&n| self.nodes[n].clone())
                .collect();
            cycle.push(self.nodes[idx].clone());
            return Err(ResolutionError::CyclicDependency(cycle));
        }
        if visited[idx] {
            return Ok(());
        }

        on_stack[idx] = true;
        path.push(idx);

        for dep_idx in 0..self.edges[idx].len() {
            let provider = self.edges[idx][dep_idx];
            self.visit(provider, visited, on_stack, path, order)?;
        }

        path.pop();
        on_stack[idx] = false;
        visited[idx] = true;
        order.push(idx);

        Ok(())
    }
}
