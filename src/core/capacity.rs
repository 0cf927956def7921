use super::types::{AssumptionSet, CapacityResult};

/// Hours available before any delegated delivery.
pub fn base_capacity_hours(assumptions: &AssumptionSet) -> f64 {
    assumptions.working_weeks_per_year * assumptions.working_hours_per_week
}

pub fn compute_capacity(assumptions: &AssumptionSet) -> CapacityResult {
    let base = base_capacity_hours(assumptions);
    if !assumptions.team_enabled {
        return CapacityResult {
            total_capacity_hours: base,
            self_delivery_hours: base,
            team_delivery_hours: 0.0,
            management_overhead_hours: 0.0,
            blended_cost_per_hour: assumptions.hourly_cost,
            team_cost: 0.0,
            self_cost: 0.0,
        };
    }

    let members = f64::from(assumptions.team_members);
    let management_overhead_hours = members * assumptions.management_hours_per_member;
    // Managing the team can eat the whole personal allowance, never more.
    let self_delivery_hours = (base - management_overhead_hours).max(0.0);
    let team_delivery_hours = members * assumptions.team_hours_per_member;
    let total_capacity_hours = self_delivery_hours + team_delivery_hours;

    let self_cost = self_delivery_hours * assumptions.hourly_cost;
    let team_cost = team_delivery_hours * assumptions.team_hourly_cost;
    let blended_cost_per_hour = if total_capacity_hours > 0.0 {
        (self_cost + team_cost) / total_capacity_hours
    } else {
        assumptions.hourly_cost
    };

    CapacityResult {
        total_capacity_hours,
        self_delivery_hours,
        team_delivery_hours,
        management_overhead_hours,
        blended_cost_per_hour,
        team_cost,
        self_cost,
    }
}
