//! Dependency graph between assumption fields and derived values.
//!
//! Each [`Node`] lists the fields it reads and the nodes it builds on. The
//! graph orders nodes so that dependencies always run first and answers which
//! nodes a field change invalidates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use super::types::Field;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Node {
    Capacity,
    BuildHoursRollup,
    SubscriptionHoursRollup,
    UnitEconomics,
    Timeline,
    BuildRetainLine,
    SubscriptionLine,
    Portfolio,
    Scenarios,
    SensitivityGrid,
}

const BUILD_PRICING: [Field; 9] = [
    Field::BuildPrice,
    Field::BuildHoursPerUnit,
    Field::RetainerOneUnit,
    Field::RetainerTwoUnits,
    Field::RetainerThreeUnits,
    Field::MaintenanceHoursPerMonth,
    Field::EngagementMonths,
    Field::BuildPhaseMonths,
    Field::UnitsPerClient,
];

impl Node {
    pub const ALL: [Node; 10] = [
        Node::Capacity,
        Node::BuildHoursRollup,
        Node::SubscriptionHoursRollup,
        Node::UnitEconomics,
        Node::Timeline,
        Node::BuildRetainLine,
        Node::SubscriptionLine,
        Node::Portfolio,
        Node::Scenarios,
        Node::SensitivityGrid,
    ];

    pub fn field_deps(self) -> &'static [Field] {
        match self {
            Node::Capacity => &[
                Field::HourlyCost,
                Field::WorkingWeeksPerYear,
                Field::WorkingHoursPerWeek,
                Field::TeamEnabled,
                Field::TeamMembers,
                Field::TeamHourlyCost,
                Field::TeamHoursPerMember,
                Field::ManagementHoursPerMember,
            ],
            Node::BuildHoursRollup => &[
                Field::DiscoveryHours,
                Field::DesignHours,
                Field::ImplementationHours,
                Field::TestingHours,
                Field::DocumentationHours,
                Field::MonthlyMaintenanceHours,
                Field::EngagementMonths,
                Field::BuildPhaseMonths,
                Field::BuildPrice,
                Field::RetainerOneUnit,
            ],
            Node::SubscriptionHoursRollup => &[
                Field::OnboardingHours,
                Field::SetupHours,
                Field::TrainingHours,
                Field::MonthlySupportHours,
                Field::QuarterlyReviewHours,
                Field::AnnualPlanningHours,
                Field::FoundationPrice,
                Field::GrowthPrice,
                Field::PartnershipPrice,
            ],
            Node::UnitEconomics => &BUILD_PRICING,
            Node::Timeline => &[
                Field::BuildPrice,
                Field::DepositPerUnit,
                Field::BuildHoursPerUnit,
                Field::RetainerOneUnit,
                Field::RetainerTwoUnits,
                Field::RetainerThreeUnits,
                Field::MaintenanceHoursPerMonth,
                Field::EngagementMonths,
                Field::BuildPhaseMonths,
                Field::UnitsPerClient,
            ],
            Node::BuildRetainLine => &[Field::AiClients, Field::UnitsPerClient],
            Node::SubscriptionLine => &[
                Field::FoundationPrice,
                Field::GrowthPrice,
                Field::PartnershipPrice,
                Field::HoursPerClient,
                Field::FoundationClients,
                Field::GrowthClients,
                Field::PartnershipClients,
            ],
            Node::Portfolio => &[Field::ProfitTarget],
            // Presets carry their own mix, so only pricing reaches them directly.
            Node::Scenarios => &[
                Field::BuildPrice,
                Field::BuildHoursPerUnit,
                Field::RetainerOneUnit,
                Field::RetainerTwoUnits,
                Field::RetainerThreeUnits,
                Field::MaintenanceHoursPerMonth,
                Field::EngagementMonths,
                Field::BuildPhaseMonths,
                Field::FoundationPrice,
                Field::GrowthPrice,
                Field::PartnershipPrice,
                Field::HoursPerClient,
                Field::ProfitTarget,
            ],
            Node::SensitivityGrid => &[
                Field::TeamEnabled,
                Field::UnitsPerClient,
                Field::FoundationPrice,
                Field::GrowthPrice,
                Field::PartnershipPrice,
                Field::HoursPerClient,
                Field::ProfitTarget,
            ],
        }
    }

    pub fn node_deps(self) -> &'static [Node] {
        match self {
            Node::Capacity
            | Node::BuildHoursRollup
            | Node::SubscriptionHoursRollup
            | Node::Timeline => &[],
            Node::UnitEconomics => &[Node::Capacity],
            Node::BuildRetainLine => &[Node::UnitEconomics, Node::Capacity],
            Node::SubscriptionLine => &[Node::Capacity],
            Node::Portfolio => &[
                Node::Capacity,
                Node::BuildRetainLine,
                Node::SubscriptionLine,
            ],
            Node::Scenarios => &[
                Node::Capacity,
                Node::BuildRetainLine,
                Node::SubscriptionLine,
                Node::Portfolio,
            ],
            Node::SensitivityGrid => &[Node::Capacity, Node::UnitEconomics],
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    order: Vec<Node>,
    rank: BTreeMap<Node, usize>,
    dependents: BTreeMap<Node, BTreeSet<Node>>,
    readers: BTreeMap<Field, BTreeSet<Node>>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        let order = topo_sort(&Node::ALL);
        let rank = order
            .iter()
            .enumerate()
            .map(|(idx, node)| (*node, idx))
            .collect();

        let mut dependents: BTreeMap<Node, BTreeSet<Node>> = BTreeMap::new();
        let mut readers: BTreeMap<Field, BTreeSet<Node>> = BTreeMap::new();
        for node in Node::ALL {
            for dep in node.node_deps() {
                dependents.entry(*dep).or_default().insert(node);
            }
            for field in node.field_deps() {
                readers.entry(*field).or_default().insert(node);
            }
        }

        Self {
            order,
            rank,
            dependents,
            readers,
        }
    }

    /// All nodes, dependencies before dependents.
    pub fn order(&self) -> &[Node] {
        &self.order
    }

    /// Nodes whose value can change when any of `fields` changes, in run order.
    pub fn invalidated_by(&self, fields: &[Field]) -> Vec<Node> {
        let mut dirty = BTreeSet::new();
        let mut stack = fields
            .iter()
            .filter_map(|field| self.readers.get(field))
            .flatten()
            .copied()
            .collect::<Vec<_>>();

        while let Some(node) = stack.pop() {
            if dirty.insert(node) {
                if let Some(next) = self.dependents.get(&node) {
                    stack.extend(next.iter().copied());
                }
            }
        }

        let mut nodes = dirty.into_iter().collect::<Vec<_>>();
        nodes.sort_by_key(|node| self.rank[node]);
        nodes
    }
}

/// Post-order walk over node dependencies so each node follows everything it
/// reads. The dependency table is static and acyclic.
fn topo_sort(nodes: &[Node]) -> Vec<Node> {
    fn add(node: Node, result: &mut Vec<Node>, used: &mut BTreeSet<Node>) {
        if !used.insert(node) {
            return;
        }
        for dep in node.node_deps() {
            add(*dep, result, used);
        }
        result.push(node);
    }

    let mut result = Vec::with_capacity(nodes.len());
    let mut used = BTreeSet::new();
    for node in nodes {
        add(*node, &mut result, &mut used);
    }
    result
}
