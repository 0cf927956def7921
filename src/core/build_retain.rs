use super::ratio::{ratio, round_half_up};
use super::types::{
    AssumptionSet, BuildHoursRollup, Line, LineMetrics, Phase, Timeline, TimelineMonth,
    UnitEconomics, UnitsPerClient,
};

/// Revenue, hours and margin of a single unit across build and maintenance,
/// priced at the retainer for `units` workflows per client.
pub fn unit_economics(
    assumptions: &AssumptionSet,
    units: UnitsPerClient,
    cost_per_hour: f64,
) -> UnitEconomics {
    let maintenance_months = assumptions.maintenance_months();
    let months = f64::from(maintenance_months);

    let build_revenue = assumptions.build_price;
    let maintenance_revenue = assumptions.retainer(units) * months;
    let total_revenue = build_revenue + maintenance_revenue;

    let build_hours = assumptions.build_hours_per_unit;
    let maintenance_hours = assumptions.maintenance_hours_per_month * months;
    let total_hours = build_hours + maintenance_hours;

    let cost = total_hours * cost_per_hour;
    let gross_margin = total_revenue - cost;

    UnitEconomics {
        units_per_client: units,
        maintenance_months,
        build_revenue,
        maintenance_revenue,
        total_revenue,
        build_hours,
        maintenance_hours,
        total_hours,
        effective_rate: ratio(total_revenue, total_hours),
        cost,
        gross_margin,
        margin_pct: ratio(gross_margin, total_revenue),
    }
}

/// Scales per-unit totals to the whole line.
pub fn line_metrics(
    unit: &UnitEconomics,
    clients: u32,
    units_per_client: u32,
    cost_per_hour: f64,
) -> LineMetrics {
    let units = u64::from(clients) * u64::from(units_per_client);
    let scale = units as f64;
    let revenue = unit.total_revenue * scale;
    let hours = unit.total_hours * scale;
    let cost = hours * cost_per_hour;
    let margin = revenue - cost;

    LineMetrics {
        line: Line::BuildRetain,
        clients: u64::from(clients),
        units,
        revenue,
        hours,
        cost,
        margin,
        effective_rate: ratio(revenue, hours),
        margin_pct: ratio(margin, revenue),
    }
}

/// Month-by-month revenue and hours for one client buying the configured
/// number of units. The retainer bills from month one, alongside the build.
pub fn monthly_timeline(assumptions: &AssumptionSet) -> Timeline {
    let units = assumptions.units_per_client;
    let unit_count = f64::from(units.count());
    let build_months = assumptions.build_phase_months;
    let retainer = assumptions.retainer(units);
    let maintenance_hours = assumptions.maintenance_hours_per_month * unit_count;

    let deposit = assumptions.deposit_per_unit * unit_count;
    let build_balance = (assumptions.build_price - assumptions.deposit_per_unit) * unit_count;
    let build_hours = assumptions.build_hours_per_unit * unit_count;
    // A zero-length build phase bills and works the whole build in month one.
    let (monthly_build_revenue, monthly_build_hours) = if build_months > 0 {
        let spread = f64::from(build_months);
        (build_balance / spread, build_hours / spread)
    } else {
        (build_balance, build_hours)
    };

    let mut months = Vec::with_capacity(assumptions.engagement_months as usize);
    for month_index in 1..=assumptions.engagement_months {
        let phase = if month_index <= build_months {
            Phase::Build
        } else {
            Phase::Maintain
        };

        let (mut revenue, mut hours) = match phase {
            Phase::Build => (monthly_build_revenue + retainer, monthly_build_hours),
            Phase::Maintain => (retainer, maintenance_hours),
        };
        if month_index == 1 {
            revenue += deposit;
            if build_months == 0 {
                revenue += monthly_build_revenue;
                hours += monthly_build_hours;
            }
        }

        months.push(TimelineMonth {
            month_index,
            label: format!("M{month_index}"),
            phase,
            revenue,
            hours,
            display_revenue: round_half_up(revenue),
            display_hours: round_half_up(hours),
        });
    }

    let total_revenue = months.iter().map(|m| m.revenue).sum();
    let total_hours = months.iter().map(|m| m.hours).sum();
    Timeline {
        units_per_client: units,
        months,
        total_revenue,
        total_hours,
    }
}

/// Sums the task-level build estimate. Not applied to the pricing fields
/// until explicitly committed.
pub fn build_hours_rollup(assumptions: &AssumptionSet) -> BuildHoursRollup {
    let build_hours = assumptions.discovery_hours
        + assumptions.design_hours
        + assumptions.implementation_hours
        + assumptions.testing_hours
        + assumptions.documentation_hours;
    let maintenance_hours_per_month = assumptions.monthly_maintenance_hours;
    let maintenance_months = f64::from(assumptions.maintenance_months());
    let maintenance_hours = maintenance_hours_per_month * maintenance_months;
    let total_hours = build_hours + maintenance_hours;
    let engagement_revenue =
        assumptions.build_price + assumptions.retainer(UnitsPerClient::One) * maintenance_months;

    BuildHoursRollup {
        build_hours,
        maintenance_hours_per_month,
        maintenance_hours,
        total_hours,
        effective_rate: ratio(engagement_revenue, total_hours),
    }
}
