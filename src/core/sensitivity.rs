use super::ratio::ratio;
use super::subscription::average_tier_price;
use super::types::{
    AssumptionSet, CapacityResult, GridCell, GridStatus, PortfolioMix, SensitivityGrid,
    UnitEconomics,
};

const SOLO_MAX_AI: u32 = 5;
const SOLO_MAX_NP: u32 = 12;
const TEAM_MAX_AI: u32 = 8;
const TEAM_MAX_NP: u32 = 20;

/// Inclusive upper bounds of the two client-count axes.
pub fn grid_bounds(team_enabled: bool) -> (u32, u32) {
    if team_enabled {
        (TEAM_MAX_AI, TEAM_MAX_NP)
    } else {
        (SOLO_MAX_AI, SOLO_MAX_NP)
    }
}

/// Unlike the portfolio status, a grid cell says which check failed.
pub fn classify_cell(hits_profit: bool, hits_hours: bool) -> GridStatus {
    match (hits_profit, hits_hours) {
        (true, true) => GridStatus::Green,
        (true, false) => GridStatus::OverHours,
        (false, true) => GridStatus::UnderProfit,
        (false, false) => GridStatus::Red,
    }
}

/// Sweeps every (AI clients, subscription clients) pair. Subscription revenue
/// uses the mean tier price rather than a per-tier mix, so one axis is enough.
pub fn sensitivity_grid(
    assumptions: &AssumptionSet,
    capacity: &CapacityResult,
    unit: &UnitEconomics,
) -> SensitivityGrid {
    let (max_ai, max_np) = grid_bounds(assumptions.team_enabled);
    let average_price = average_tier_price(assumptions);
    let units_per_client = f64::from(assumptions.units_per_client.count());
    let cost_per_hour = capacity.blended_cost_per_hour;

    let cells = (0..=max_ai)
        .map(|ai| {
            let ai_units = f64::from(ai) * units_per_client;
            let ai_revenue = ai_units * unit.total_revenue;
            let ai_hours = ai_units * unit.total_hours;
            (0..=max_np)
                .map(|np| {
                    let np_revenue = f64::from(np) * average_price;
                    let np_hours = f64::from(np) * assumptions.hours_per_client;
                    let revenue = ai_revenue + np_revenue;
                    let hours = ai_hours + np_hours;
                    let cost = hours * cost_per_hour;
                    let margin = revenue - cost;
                    let hits_profit = margin >= assumptions.profit_target;
                    let hits_hours = hours <= capacity.total_capacity_hours;
                    GridCell {
                        ai,
                        np,
                        revenue,
                        hours,
                        cost,
                        margin,
                        effective_rate: ratio(revenue, hours),
                        margin_pct: ratio(margin, revenue),
                        status: classify_cell(hits_profit, hits_hours),
                    }
                })
                .collect()
        })
        .collect();

    SensitivityGrid {
        max_ai,
        max_np,
        average_tier_price: average_price,
        cells,
    }
}

/// Mix written when a grid cell is picked: the subscription count is spread
/// over the tiers, extra clients going to the cheaper tiers first.
pub fn mix_for_cell(assumptions: &AssumptionSet, ai: u32, np: u32) -> PortfolioMix {
    let per_tier = np / 3;
    let remainder = np % 3;
    PortfolioMix {
        ai_clients: ai,
        units_per_client: assumptions.units_per_client.count(),
        foundation_clients: per_tier + u32::from(remainder > 0),
        growth_clients: per_tier + u32::from(remainder > 1),
        partnership_clients: per_tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::build_retain::unit_economics;
    use crate::core::capacity::compute_capacity;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn grid_for(assumptions: &AssumptionSet) -> SensitivityGrid {
        let capacity = compute_capacity(assumptions);
        let unit = unit_economics(
            assumptions,
            assumptions.units_per_client,
            capacity.blended_cost_per_hour,
        );
        sensitivity_grid(assumptions, &capacity, &unit)
    }

    #[test]
    fn solo_grid_spans_five_by_twelve() {
        let grid = grid_for(&AssumptionSet::default());
        assert_eq!((grid.max_ai, grid.max_np), (5, 12));
        assert_eq!(grid.cells.len(), 6);
        assert!(grid.cells.iter().all(|row| row.len() == 13));
        assert_approx(grid.average_tier_price, 15_000.0);
    }

    #[test]
    fn team_grid_widens_bounds() {
        let assumptions = AssumptionSet {
            team_enabled: true,
            ..AssumptionSet::default()
        };
        let grid = grid_for(&assumptions);
        assert_eq!((grid.max_ai, grid.max_np), (8, 20));
        assert_eq!(grid.cells.len(), 9);
        assert_eq!(grid.cells[0].len(), 21);
    }

    #[test]
    fn empty_cell_is_under_profit_for_positive_target() {
        let grid = grid_for(&AssumptionSet::default());
        let origin = grid.cell(0, 0).expect("origin cell");
        assert_eq!(origin.revenue, 0.0);
        assert_eq!(origin.hours, 0.0);
        assert_eq!(origin.margin, 0.0);
        assert_eq!(origin.effective_rate, 0.0);
        assert_eq!(origin.status, GridStatus::UnderProfit);
    }

    #[test]
    fn empty_cell_is_green_without_target() {
        let assumptions = AssumptionSet {
            profit_target: 0.0,
            ..AssumptionSet::default()
        };
        let grid = grid_for(&assumptions);
        assert_eq!(grid.cell(0, 0).map(|c| c.status), Some(GridStatus::Green));
    }

    #[test]
    fn cell_uses_average_tier_price() {
        let grid = grid_for(&AssumptionSet::default());
        let cell = grid.cell(2, 3).expect("cell in range");
        assert_approx(cell.revenue, 2.0 * 45_000.0 + 3.0 * 15_000.0);
        assert_approx(cell.hours, 2.0 * 140.0 + 3.0 * 67.0);
        assert_approx(cell.margin, cell.revenue - cell.hours * 100.0);
    }

    #[test]
    fn cells_report_all_four_statuses() {
        let grid = grid_for(&AssumptionSet::default());
        // 5 AI + 12 NP: 405k revenue, 1 504 hours, 254.6k margin
        assert_eq!(grid.cell(5, 12).map(|c| c.status), Some(GridStatus::OverHours));
        // 4 AI + 2 NP: 210k revenue, 694 hours, 140.6k margin
        assert_eq!(grid.cell(4, 2).map(|c| c.status), Some(GridStatus::Green));
        assert_eq!(grid.cell(1, 1).map(|c| c.status), Some(GridStatus::UnderProfit));

        let strained = AssumptionSet {
            working_weeks_per_year: 1.0,
            working_hours_per_week: 1.0,
            ..AssumptionSet::default()
        };
        let grid = grid_for(&strained);
        assert_eq!(grid.cell(1, 0).map(|c| c.status), Some(GridStatus::Red));
    }

    #[test]
    fn cell_statuses_differ_from_portfolio_labels() {
        assert_eq!(classify_cell(true, false), GridStatus::OverHours);
        assert_eq!(classify_cell(false, true), GridStatus::UnderProfit);
        assert_eq!(classify_cell(false, false), GridStatus::Red);
        assert_eq!(classify_cell(true, true), GridStatus::Green);
    }

    #[test]
    fn cell_selection_spreads_remainder_to_lower_tiers() {
        let assumptions = AssumptionSet::default();
        let mix = mix_for_cell(&assumptions, 3, 7);
        assert_eq!(mix.ai_clients, 3);
        assert_eq!(
            (mix.foundation_clients, mix.growth_clients, mix.partnership_clients),
            (3, 2, 2)
        );
        let mix = mix_for_cell(&assumptions, 0, 8);
        assert_eq!(
            (mix.foundation_clients, mix.growth_clients, mix.partnership_clients),
            (3, 3, 2)
        );
        let mix = mix_for_cell(&assumptions, 0, 9);
        assert_eq!(
            (mix.foundation_clients, mix.growth_clients, mix.partnership_clients),
            (3, 3, 3)
        );
    }

    proptest! {
        #[test]
        fn prop_cell_selection_preserves_total(ai in 0u32..10, np in 0u32..40) {
            let mix = mix_for_cell(&AssumptionSet::default(), ai, np);
            prop_assert_eq!(mix.subscription_clients(), u64::from(np));
            prop_assert!(mix.foundation_clients >= mix.growth_clients);
            prop_assert!(mix.growth_clients >= mix.partnership_clients);
            prop_assert!(mix.foundation_clients - mix.partnership_clients <= 1);
        }

        #[test]
        fn prop_cell_rates_are_guarded(hours_per_client in 0u32..200, build_hours in 0u32..200) {
            let assumptions = AssumptionSet {
                hours_per_client: f64::from(hours_per_client),
                build_hours_per_unit: f64::from(build_hours),
                maintenance_hours_per_month: 0.0,
                ..AssumptionSet::default()
            };
            let grid = grid_for(&assumptions);
            for cell in grid.cells.iter().flatten() {
                if cell.hours > 0.0 {
                    prop_assert_eq!(cell.effective_rate, cell.revenue / cell.hours);
                } else {
                    prop_assert_eq!(cell.effective_rate, 0.0);
                }
            }
        }
    }
}
