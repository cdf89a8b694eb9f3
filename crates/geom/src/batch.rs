use crate::GeomError;
use crate::requirements::{GeomRequirements, RenderState};
use meshpage_common::TextureRef;
use std::fmt;

/// One batch node: where it hangs and what state it sets.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNodeSpec {
    /// `None` for the root.
    pub parent: Option<usize>,
    pub state: RenderState,
}

/// Hierarchy of batch nodes plus the node every requirement draws into.
///
/// Node 0 is always the root. Built through [`BatchLayoutPlan::new`],
/// [`add_node`](BatchLayoutPlan::add_node) and [`assign`](BatchLayoutPlan::assign),
/// then checked with [`validate`](BatchLayoutPlan::validate) before use.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLayoutPlan {
    nodes: Vec<BatchNodeSpec>,
    assignment: Vec<usize>,
}

impl Default for BatchLayoutPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchLayoutPlan {
    /// A plan holding only an unstyled root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![BatchNodeSpec {
                parent: None,
                state: RenderState::default(),
            }],
            assignment: Vec::new(),
        }
    }

    pub const ROOT: usize = 0;

    /// Append a node under `parent` and return its index.
    pub fn add_node(&mut self, parent: usize, state: RenderState) -> usize {
        self.nodes.push(BatchNodeSpec {
            parent: Some(parent),
            state,
        });
        self.nodes.len() - 1
    }

    /// Assign the next requirement (in id order) to `node`.
    pub fn assign(&mut self, node: usize) {
        self.assignment.push(node);
    }

    pub fn nodes(&self) -> &[BatchNodeSpec] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&BatchNodeSpec> {
        self.nodes.get(index)
    }

    /// Batch node index for each requirement index.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn node_for(&self, requirement: usize) -> Option<usize> {
        self.assignment.get(requirement).copied()
    }

    /// Effective state of a node once its ancestors' state is applied.
    pub fn effective_state(&self, index: usize) -> RenderState {
        let Some(spec) = self.nodes.get(index) else {
            return RenderState::default();
        };
        match spec.parent {
            Some(parent) => spec.state.inherit(&self.effective_state(parent)),
            None => spec.state.clone(),
        }
    }

    /// Check the structural invariants factories rely on.
    pub fn validate(&self, requirement_count: usize) -> Result<(), GeomError> {
        match self.nodes.first() {
            Some(root) if root.parent.is_none() => {}
            _ => return Err(GeomError::InvalidPlan("node 0 must be the root".into())),
        }
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            match node.parent {
                Some(p) if p < i => {}
                Some(p) => {
                    return Err(GeomError::InvalidPlan(format!(
                        "node {i} has parent {p}, parents must come first"
                    )));
                }
                None => {
                    return Err(GeomError::InvalidPlan(format!(
                        "node {i} is a second root"
                    )));
                }
            }
        }
        if self.assignment.len() != requirement_count {
            return Err(GeomError::InvalidPlan(format!(
                "{} requirements but {} assignments",
                requirement_count,
                self.assignment.len()
            )));
        }
        if let Some(bad) = self.assignment.iter().find(|&&n| n >= self.nodes.len()) {
            return Err(GeomError::InvalidPlan(format!(
                "assignment to missing node {bad}"
            )));
        }
        Ok(())
    }
}

/// Policy that groups requirements into batch nodes.
///
/// Must be deterministic: the same requirement sequence always yields the
/// same plan.
pub trait BatchStrategy: fmt::Debug + Send + Sync {
    fn plan(&self, requirements: &[GeomRequirements]) -> BatchLayoutPlan;
}

/// One root and one child per requirement carrying that requirement's state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodePerRequirement;

impl BatchStrategy for NodePerRequirement {
    fn plan(&self, requirements: &[GeomRequirements]) -> BatchLayoutPlan {
        let mut plan = BatchLayoutPlan::new();
        for r in requirements {
            let node = plan.add_node(BatchLayoutPlan::ROOT, r.render_state());
            plan.assign(node);
        }
        plan
    }
}

/// Shares nodes between requirements whose render state matches.
///
/// Layout: root, then one node per distinct texture, then below it one node
/// per distinct non-default `(transparency, shader_settings)` pair.
/// Untextured requirements hang off the root directly, and requirements that
/// differ only by vertex layout land on the same node.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedStateGrouping;

impl BatchStrategy for SharedStateGrouping {
    fn plan(&self, requirements: &[GeomRequirements]) -> BatchLayoutPlan {
        let mut plan = BatchLayoutPlan::new();
        let mut texture_nodes: Vec<(TextureRef, usize)> = Vec::new();
        let mut state_nodes: Vec<(usize, RenderState, usize)> = Vec::new();

        // Linear scans keep the plan independent of hashing order.
        for r in requirements {
            let texture_node = match &r.texture {
                None => BatchLayoutPlan::ROOT,
                Some(tex) => match texture_nodes.iter().find(|(t, _)| t == tex) {
                    Some((_, n)) => *n,
                    None => {
                        let n = plan.add_node(
                            BatchLayoutPlan::ROOT,
                            RenderState {
                                texture: Some(tex.clone()),
                                ..RenderState::default()
                            },
                        );
                        texture_nodes.push((tex.clone(), n));
                        n
                    }
                },
            };

            let residual = RenderState {
                texture: None,
                transparency: r.transparency,
                shader_settings: r.shader_settings.clone(),
            };
            if residual.is_default() {
                plan.assign(texture_node);
                continue;
            }
            let existing = state_nodes
                .iter()
                .find(|(parent, state, _)| *parent == texture_node && *state == residual)
                .map(|(_, _, n)| *n);
            let node = match existing {
                Some(n) => n,
                None => {
                    let n = plan.add_node(texture_node, residual.clone());
                    state_nodes.push((texture_node, residual, n));
                    n
                }
            };
            plan.assign(node);
        }
        plan
    }
}
