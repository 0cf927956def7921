use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::build_retain::{build_hours_rollup, line_metrics, monthly_timeline, unit_economics};
use super::capacity::compute_capacity;
use super::error::EngineError;
use super::graph::{DependencyGraph, Node};
use super::portfolio::aggregate;
use super::scenario::{applied_units, evaluate_scenarios, find_preset};
use super::sensitivity::{mix_for_cell, sensitivity_grid};
use super::subscription::{subscription_hours_rollup, subscription_metrics};
use super::types::{
    AssumptionSet, BuildHoursRollup, CapacityResult, Field, FieldValue, Line, LineMetrics,
    PortfolioMetrics, PortfolioMix, ScenarioResult, SensitivityGrid, SubscriptionHoursRollup,
    SubscriptionMetrics, Timeline, UnitEconomics,
};

/// Every derived value, always consistent with the engine's assumptions.
#[derive(Debug, Clone, PartialEq)]
struct Derived {
    capacity: CapacityResult,
    build_rollup: BuildHoursRollup,
    subscription_rollup: SubscriptionHoursRollup,
    unit: UnitEconomics,
    timeline: Timeline,
    build_retain: LineMetrics,
    subscription: SubscriptionMetrics,
    portfolio: PortfolioMetrics,
    scenarios: Vec<ScenarioResult>,
    grid: SensitivityGrid,
}

impl Derived {
    fn compute(assumptions: &AssumptionSet) -> Self {
        let capacity = compute_capacity(assumptions);
        let cost_per_hour = capacity.blended_cost_per_hour;
        let mix = PortfolioMix::from_assumptions(assumptions);
        let unit = unit_economics(assumptions, assumptions.units_per_client, cost_per_hour);
        let build_retain = line_metrics(
            &unit,
            assumptions.ai_clients,
            assumptions.units_per_client.count(),
            cost_per_hour,
        );
        let subscription = subscription_metrics(assumptions, &mix, cost_per_hour);
        let portfolio = aggregate(
            &build_retain,
            &subscription.total,
            capacity.total_capacity_hours,
            assumptions.profit_target,
        );
        let scenarios = evaluate_scenarios(
            assumptions,
            &capacity,
            &build_retain,
            &subscription.total,
            &portfolio,
        );
        let grid = sensitivity_grid(assumptions, &capacity, &unit);

        Self {
            build_rollup: build_hours_rollup(assumptions),
            subscription_rollup: subscription_hours_rollup(assumptions),
            timeline: monthly_timeline(assumptions),
            capacity,
            unit,
            build_retain,
            subscription,
            portfolio,
            scenarios,
            grid,
        }
    }

    /// Rebuilds one node from the assumptions and the already-current values
    /// of the nodes it depends on.
    fn recompute(&mut self, node: Node, assumptions: &AssumptionSet) {
        let cost_per_hour = self.capacity.blended_cost_per_hour;
        match node {
            Node::Capacity => self.capacity = compute_capacity(assumptions),
            Node::BuildHoursRollup => self.build_rollup = build_hours_rollup(assumptions),
            Node::SubscriptionHoursRollup => {
                self.subscription_rollup = subscription_hours_rollup(assumptions)
            }
            Node::UnitEconomics => {
                self.unit = unit_economics(assumptions, assumptions.units_per_client, cost_per_hour)
            }
            Node::Timeline => self.timeline = monthly_timeline(assumptions),
            Node::BuildRetainLine => {
                self.build_retain = line_metrics(
                    &self.unit,
                    assumptions.ai_clients,
                    assumptions.units_per_client.count(),
                    cost_per_hour,
                )
            }
            Node::SubscriptionLine => {
                let mix = PortfolioMix::from_assumptions(assumptions);
                self.subscription = subscription_metrics(assumptions, &mix, cost_per_hour)
            }
            Node::Portfolio => {
                self.portfolio = aggregate(
                    &self.build_retain,
                    &self.subscription.total,
                    self.capacity.total_capacity_hours,
                    assumptions.profit_target,
                )
            }
            Node::Scenarios => {
                self.scenarios = evaluate_scenarios(
                    assumptions,
                    &self.capacity,
                    &self.build_retain,
                    &self.subscription.total,
                    &self.portfolio,
                )
            }
            Node::SensitivityGrid => {
                self.grid = sensitivity_grid(assumptions, &self.capacity, &self.unit)
            }
        }
    }
}

/// Everything the UI reads in one pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot<'a> {
    pub assumptions: &'a AssumptionSet,
    pub capacity: &'a CapacityResult,
    pub unit_economics: &'a UnitEconomics,
    pub build_retain: &'a LineMetrics,
    pub subscription: &'a SubscriptionMetrics,
    pub portfolio: &'a PortfolioMetrics,
    pub timeline: &'a Timeline,
    pub scenarios: &'a [ScenarioResult],
    pub grid: &'a SensitivityGrid,
    pub build_breakdown: &'a BuildHoursRollup,
    pub subscription_breakdown: &'a SubscriptionHoursRollup,
}

/// Owns the session's assumptions and keeps every derived value current.
/// Writes recompute exactly the nodes downstream of the changed fields.
#[derive(Debug, Clone)]
pub struct PortfolioEngine {
    assumptions: AssumptionSet,
    graph: DependencyGraph,
    derived: Derived,
    recomputes: BTreeMap<Node, u64>,
}

impl Default for PortfolioEngine {
    fn default() -> Self {
        Self::new(AssumptionSet::default())
    }
}

impl PortfolioEngine {
    pub fn new(assumptions: AssumptionSet) -> Self {
        let derived = Derived::compute(&assumptions);
        Self {
            assumptions,
            graph: DependencyGraph::new(),
            derived,
            recomputes: BTreeMap::new(),
        }
    }

    pub fn assumptions(&self) -> &AssumptionSet {
        &self.assumptions
    }

    pub fn read(&self, field: Field) -> FieldValue {
        self.assumptions.get(field)
    }

    pub fn write(&mut self, field: Field, value: impl Into<FieldValue>) -> Result<(), EngineError> {
        self.write_many(&[(field, value.into())])
    }

    /// Applies several field writes as one change. Either every write is
    /// accepted or the assumptions are left untouched.
    pub fn write_many(&mut self, writes: &[(Field, FieldValue)]) -> Result<(), EngineError> {
        let mut next = self.assumptions.clone();
        for (field, value) in writes {
            if let Err(err) = next.set(*field, *value) {
                warn!(%field, ?value, error = %err, "rejected assumption write");
                return Err(err);
            }
        }
        let fields = writes.iter().map(|(field, _)| *field).collect::<Vec<_>>();
        let dirty = self.graph.invalidated_by(&fields);
        debug!(?fields, ?dirty, "recomputing derived values");

        // Assumptions and derived values are swapped in together once every
        // invalidated node is rebuilt.
        let mut derived = self.derived.clone();
        for node in &dirty {
            derived.recompute(*node, &next);
        }
        self.assumptions = next;
        self.derived = derived;
        for node in dirty {
            *self.recomputes.entry(node).or_insert(0) += 1;
        }
        Ok(())
    }

    /// Overwrites the mix fields with a named preset. Pricing and cost
    /// assumptions are untouched.
    pub fn apply_scenario(&mut self, name: &str) -> Result<(), EngineError> {
        let preset = find_preset(name)?;
        let mix = preset.mix;
        info!(scenario = preset.name, "applying scenario mix");
        self.write_many(&[
            (Field::AiClients, mix.ai_clients.into()),
            (Field::UnitsPerClient, applied_units(&mix).into()),
            (Field::FoundationClients, mix.foundation_clients.into()),
            (Field::GrowthClients, mix.growth_clients.into()),
            (Field::PartnershipClients, mix.partnership_clients.into()),
        ])
    }

    /// Writes the AI client count and spreads `np` subscription clients over
    /// the three tiers.
    pub fn select_grid_cell(&mut self, ai: u32, np: u32) -> Result<(), EngineError> {
        let mix = mix_for_cell(&self.assumptions, ai, np);
        info!(ai, np, "applying sensitivity grid cell");
        self.write_many(&[
            (Field::AiClients, mix.ai_clients.into()),
            (Field::FoundationClients, mix.foundation_clients.into()),
            (Field::GrowthClients, mix.growth_clients.into()),
            (Field::PartnershipClients, mix.partnership_clients.into()),
        ])
    }

    /// Copies the task-level build estimate into the pricing inputs.
    pub fn commit_build_breakdown(&mut self) -> Result<(), EngineError> {
        let rollup = &self.derived.build_rollup;
        let writes = [
            (Field::BuildHoursPerUnit, rollup.build_hours.into()),
            (
                Field::MaintenanceHoursPerMonth,
                rollup.maintenance_hours_per_month.into(),
            ),
        ];
        self.write_many(&writes)
    }

    /// Copies the onboarding + ongoing estimate into the per-client hours.
    pub fn commit_subscription_breakdown(&mut self) -> Result<(), EngineError> {
        let total = self.derived.subscription_rollup.total_hours;
        self.write(Field::HoursPerClient, total)
    }

    pub fn capacity(&self) -> &CapacityResult {
        &self.derived.capacity
    }

    pub fn unit_economics(&self) -> &UnitEconomics {
        &self.derived.unit
    }

    pub fn line_metrics(&self, line: Line) -> &LineMetrics {
        match line {
            Line::BuildRetain => &self.derived.build_retain,
            Line::Subscription => &self.derived.subscription.total,
        }
    }

    pub fn subscription_metrics(&self) -> &SubscriptionMetrics {
        &self.derived.subscription
    }

    pub fn portfolio(&self) -> &PortfolioMetrics {
        &self.derived.portfolio
    }

    pub fn monthly_timeline(&self) -> &Timeline {
        &self.derived.timeline
    }

    pub fn scenarios(&self) -> &[ScenarioResult] {
        &self.derived.scenarios
    }

    pub fn sensitivity_grid(&self) -> &SensitivityGrid {
        &self.derived.grid
    }

    pub fn build_breakdown(&self) -> &BuildHoursRollup {
        &self.derived.build_rollup
    }

    pub fn subscription_breakdown(&self) -> &SubscriptionHoursRollup {
        &self.derived.subscription_rollup
    }

    pub fn snapshot(&self) -> EngineSnapshot<'_> {
        EngineSnapshot {
            assumptions: &self.assumptions,
            capacity: &self.derived.capacity,
            unit_economics: &self.derived.unit,
            build_retain: &self.derived.build_retain,
            subscription: &self.derived.subscription,
            portfolio: &self.derived.portfolio,
            timeline: &self.derived.timeline,
            scenarios: &self.derived.scenarios,
            grid: &self.derived.grid,
            build_breakdown: &self.derived.build_rollup,
            subscription_breakdown: &self.derived.subscription_rollup,
        }
    }

    /// How many times each node has been rebuilt by writes since creation.
    pub fn recompute_count(&self, node: Node) -> u64 {
        self.recomputes.get(&node).copied().unwrap_or(0)
    }
}
