//! The group/well tree.
//!
//! Nodes live in an arena; children are owned through indices and parent
//! links are non-owning back-references into the same arena, so traversal
//! can never touch a freed parent. The root group outlives every subtree.

use rf_core::{NodeId, Real};
use rf_fluids::Phase;
use rf_wells::WellStates;

use crate::engine::GroupControlConfig;
use crate::error::{GroupError, GroupResult};
use crate::rates::RateBasis;
use crate::spec::{InjectionSpec, ProductionSpec};

/// Group- or well-specific node payload.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Group {
        children: Vec<NodeId>,
    },
    Well {
        /// Index into the flat well-states array.
        well_index: usize,
        /// Slot in the well's control list owned by group control.
        group_control_slot: Option<usize>,
        /// Whether shutting this well disables it outright.
        hard_shut: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub efficiency_factor: Real,
    pub prod_spec: ProductionSpec,
    pub inj_spec: InjectionSpec,
    pub parent: Option<NodeId>,
    /// Wells start under individual control; groups use this to mean "not
    /// under a parent group's control".
    pub individual_control: bool,
    pub should_update_targets: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Well { .. })
    }

    pub fn well_index(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Well { well_index, .. } => Some(*well_index),
            NodeKind::Group { .. } => None,
        }
    }
}

/// Arena-backed tree with exactly one root group.
#[derive(Clone, Debug)]
pub struct WellGroupTree {
    nodes: Vec<Node>,
    root: NodeId,
    pub(crate) config: GroupControlConfig,
}

impl WellGroupTree {
    /// Start a tree from its root group.
    pub fn with_root(
        name: impl Into<String>,
        efficiency_factor: Real,
        prod_spec: ProductionSpec,
        inj_spec: InjectionSpec,
        config: GroupControlConfig,
    ) -> Self {
        let root = Node {
            name: name.into(),
            efficiency_factor,
            prod_spec,
            inj_spec,
            parent: None,
            individual_control: true,
            should_update_targets: false,
            kind: NodeKind::Group { children: vec![] },
        };
        Self {
            nodes: vec![root],
            root: NodeId::from_index(0),
            config,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index() as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> GroupResult<NodeId> {
        match self.node(parent).kind {
            NodeKind::Group { .. } => {}
            NodeKind::Well { .. } => {
                return Err(GroupError::NodeKindMismatch {
                    name: self.node(parent).name.clone(),
                    expected: "group",
                })
            }
        }
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(node);
        if let NodeKind::Group { children } = &mut self.node_mut(parent).kind {
            children.push(id);
        }
        Ok(id)
    }

    pub fn add_group(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        efficiency_factor: Real,
        prod_spec: ProductionSpec,
        inj_spec: InjectionSpec,
    ) -> GroupResult<NodeId> {
        self.attach(
            parent,
            Node {
                name: name.into(),
                efficiency_factor,
                prod_spec,
                inj_spec,
                parent: Some(parent),
                individual_control: true,
                should_update_targets: false,
                kind: NodeKind::Group { children: vec![] },
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_well(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        efficiency_factor: Real,
        prod_spec: ProductionSpec,
        inj_spec: InjectionSpec,
        well_index: usize,
        hard_shut: bool,
    ) -> GroupResult<NodeId> {
        self.attach(
            parent,
            Node {
                name: name.into(),
                efficiency_factor,
                prod_spec,
                inj_spec,
                parent: Some(parent),
                individual_control: true,
                should_update_targets: false,
                kind: NodeKind::Well {
                    well_index,
                    group_control_slot: None,
                    hard_shut,
                },
            },
        )
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Group { children } => children,
            NodeKind::Well { .. } => &[],
        }
    }

    /// Depth-first name lookup.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.find_below(self.root, name)
    }

    fn find_below(&self, id: NodeId, name: &str) -> Option<NodeId> {
        if self.node(id).name == name {
            return Some(id);
        }
        for child in self.children(id) {
            if let Some(found) = self.find_below(*child, name) {
                return Some(found);
            }
        }
        None
    }

    pub fn number_of_leaves(&self, id: NodeId) -> usize {
        if self.node(id).is_leaf() {
            return 1;
        }
        self.children(id)
            .iter()
            .map(|c| self.number_of_leaves(*c))
            .sum()
    }

    /// Effective efficiency of a node: the product of factors up to the root.
    pub fn accumulated_efficiency(&self, id: NodeId) -> Real {
        let mut factor = self.node(id).efficiency_factor;
        let mut cursor = self.node(id).parent;
        while let Some(parent) = cursor {
            factor *= self.node(parent).efficiency_factor;
            cursor = self.node(parent).parent;
        }
        factor
    }

    /// Production guide rate. With `only_group`, wells under individual
    /// control contribute nothing and are skipped in group sums.
    pub fn production_guide_rate(&self, id: NodeId, only_group: bool) -> Real {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Well { .. } => {
                if !only_group || !node.individual_control {
                    node.prod_spec.guide_rate
                } else {
                    0.0
                }
            }
            NodeKind::Group { children } => children
                .iter()
                .filter(|c| !only_group || !self.node(**c).individual_control)
                .map(|c| self.production_guide_rate(*c, only_group))
                .sum(),
        }
    }

    /// Injection guide rate; groups always recurse into every child.
    pub fn injection_guide_rate(&self, id: NodeId, only_group: bool) -> Real {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Well { .. } => {
                if !only_group || !node.individual_control {
                    node.inj_spec.guide_rate
                } else {
                    0.0
                }
            }
            NodeKind::Group { children } => children
                .iter()
                .map(|c| self.injection_guide_rate(*c, only_group))
                .sum(),
        }
    }

    /// Total production flow of one phase over the subtree; injectors
    /// contribute nothing.
    pub fn total_production_flow(
        &self,
        id: NodeId,
        well_states: &WellStates,
        phase: Phase,
        basis: RateBasis,
    ) -> Real {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Well { well_index, .. } => {
                let well = well_states.well(*well_index);
                if well.is_injector() {
                    return 0.0;
                }
                match basis {
                    RateBasis::Surface => well.surface_rate(phase),
                    RateBasis::Reservoir => well.reservoir_rate(phase),
                }
            }
            NodeKind::Group { children } => children
                .iter()
                .map(|c| self.total_production_flow(*c, well_states, phase, basis))
                .sum(),
        }
    }

    /// Visit the tree depth-first, parents before children.
    pub fn visit_depth_first(&self, mut f: impl FnMut(NodeId, &Node)) {
        self.visit_below(self.root, &mut f);
    }

    fn visit_below(&self, id: NodeId, f: &mut impl FnMut(NodeId, &Node)) {
        f(id, self.node(id));
        for child in self.children(id) {
            self.visit_below(*child, f);
        }
    }
}
