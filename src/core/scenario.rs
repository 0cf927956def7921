use super::build_retain::{line_metrics, unit_economics};
use super::error::EngineError;
use super::portfolio::aggregate;
use super::subscription::subscription_metrics;
use super::types::{
    AssumptionSet, CapacityResult, Line, LineMetrics, PortfolioMetrics, PortfolioMix,
    ScenarioKind, ScenarioResult, UnitsPerClient,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub mix: PortfolioMix,
}

const fn preset(
    name: &'static str,
    description: &'static str,
    ai_clients: u32,
    units_per_client: u32,
    tiers: [u32; 3],
) -> ScenarioPreset {
    ScenarioPreset {
        name,
        description,
        mix: PortfolioMix {
            ai_clients,
            units_per_client,
            foundation_clients: tiers[0],
            growth_clients: tiers[1],
            partnership_clients: tiers[2],
        },
    }
}

pub const SCENARIO_PRESETS: [ScenarioPreset; 4] = [
    preset("AI Heavy", "Focus on high-margin AI work", 3, 1, [1, 1, 0]),
    preset("Balanced", "Mix of AI & NP revenue", 2, 1, [2, 1, 1]),
    preset("NP Heavy", "Stable nonprofit base", 1, 1, [2, 2, 2]),
    preset("NP Only", "Predictable NP portfolio", 0, 0, [3, 3, 2]),
];

pub const CURRENT_SCENARIO_NAME: &str = "Current";

pub fn find_preset(name: &str) -> Result<&'static ScenarioPreset, EngineError> {
    SCENARIO_PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| EngineError::UnknownScenario(name.to_string()))
}

/// Units-per-client to write when a preset is applied. Presets without build
/// work still leave a priced value behind.
pub fn applied_units(mix: &PortfolioMix) -> UnitsPerClient {
    UnitsPerClient::try_from(mix.units_per_client).unwrap_or(UnitsPerClient::One)
}

/// Evaluates one mix with the current pricing and cost assumptions.
pub fn evaluate_mix(
    assumptions: &AssumptionSet,
    capacity: &CapacityResult,
    mix: &PortfolioMix,
) -> (LineMetrics, LineMetrics, PortfolioMetrics) {
    let cost_per_hour = capacity.blended_cost_per_hour;
    let build_retain = match UnitsPerClient::try_from(mix.units_per_client) {
        Ok(units) => {
            let unit = unit_economics(assumptions, units, cost_per_hour);
            line_metrics(&unit, mix.ai_clients, units.count(), cost_per_hour)
        }
        Err(_) => empty_build_line(mix.ai_clients),
    };
    let subscription = subscription_metrics(assumptions, mix, cost_per_hour).total;
    let metrics = aggregate(
        &build_retain,
        &subscription,
        capacity.total_capacity_hours,
        assumptions.profit_target,
    );
    (build_retain, subscription, metrics)
}

fn empty_build_line(clients: u32) -> LineMetrics {
    LineMetrics {
        line: Line::BuildRetain,
        clients: u64::from(clients),
        units: 0,
        revenue: 0.0,
        hours: 0.0,
        cost: 0.0,
        margin: 0.0,
        effective_rate: 0.0,
        margin_pct: 0.0,
    }
}

/// Every preset followed by the live configuration, ready to be plotted on
/// the same axes.
pub fn evaluate_scenarios(
    assumptions: &AssumptionSet,
    capacity: &CapacityResult,
    current_build_retain: &LineMetrics,
    current_subscription: &LineMetrics,
    current: &PortfolioMetrics,
) -> Vec<ScenarioResult> {
    let mut results = SCENARIO_PRESETS
        .iter()
        .map(|preset| {
            let (build_retain, subscription, metrics) =
                evaluate_mix(assumptions, capacity, &preset.mix);
            ScenarioResult {
                name: preset.name.to_string(),
                description: preset.description.to_string(),
                kind: ScenarioKind::Preset,
                mix: preset.mix,
                build_retain,
                subscription,
                metrics,
            }
        })
        .collect::<Vec<_>>();

    results.push(ScenarioResult {
        name: CURRENT_SCENARIO_NAME.to_string(),
        description: "Your current configuration".to_string(),
        kind: ScenarioKind::Current,
        mix: PortfolioMix::from_assumptions(assumptions),
        build_retain: current_build_retain.clone(),
        subscription: current_subscription.clone(),
        metrics: current.clone(),
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capacity::compute_capacity;
    use crate::core::types::PortfolioStatus;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn evaluate_defaults() -> Vec<ScenarioResult> {
        let assumptions = AssumptionSet::default();
        let capacity = compute_capacity(&assumptions);
        let mix = PortfolioMix::from_assumptions(&assumptions);
        let (build_retain, subscription, current) = evaluate_mix(&assumptions, &capacity, &mix);
        evaluate_scenarios(&assumptions, &capacity, &build_retain, &subscription, &current)
    }

    #[test]
    fn catalog_is_evaluated_in_order_with_current_last() {
        let results = evaluate_defaults();
        let names = results.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["AI Heavy", "Balanced", "NP Heavy", "NP Only", "Current"]
        );
        assert_eq!(results[4].kind, ScenarioKind::Current);
        assert!(results[..4].iter().all(|r| r.kind == ScenarioKind::Preset));
    }

    #[test]
    fn ai_heavy_uses_shared_pricing() {
        let results = evaluate_defaults();
        let ai_heavy = &results[0].metrics;
        // 3 units at 45k/140h plus one Foundation and one Growth client
        assert_approx(ai_heavy.revenue, 3.0 * 45_000.0 + 12_000.0 + 15_000.0);
        assert_approx(ai_heavy.hours, 3.0 * 140.0 + 2.0 * 67.0);
        assert_approx(ai_heavy.cost, ai_heavy.hours * 100.0);
        assert_approx(ai_heavy.margin, ai_heavy.revenue - ai_heavy.cost);
        assert_approx(ai_heavy.margin, 106_600.0);
        assert_eq!(ai_heavy.status, PortfolioStatus::Amber);
    }

    #[test]
    fn np_only_has_no_build_share() {
        let results = evaluate_defaults();
        let np_only = &results[3];
        assert_eq!(np_only.build_retain.revenue, 0.0);
        assert_eq!(np_only.metrics.ai_share, 0.0);
        assert_approx(np_only.metrics.np_share, 1.0);
        assert_approx(np_only.metrics.revenue, 3.0 * 12_000.0 + 3.0 * 15_000.0 + 2.0 * 18_000.0);
    }

    #[test]
    fn current_record_mirrors_live_portfolio() {
        let results = evaluate_defaults();
        let current = &results[4];
        assert_approx(current.metrics.revenue, 162_000.0);
        assert_approx(current.metrics.hours, 615.0);
        assert_eq!(current.mix.ai_clients, 2);
    }

    #[test]
    fn preset_lookup_ignores_case() {
        assert_eq!(find_preset("np only").map(|p| p.name), Ok("NP Only"));
        assert_eq!(
            find_preset("Hyper Growth"),
            Err(EngineError::UnknownScenario("Hyper Growth".to_string()))
        );
    }

    #[test]
    fn zero_unit_preset_applies_smallest_size() {
        let np_only = find_preset("NP Only").expect("preset exists");
        assert_eq!(applied_units(&np_only.mix), UnitsPerClient::One);
    }
}
