use super::ratio::ratio;
use super::types::{
    AssumptionSet, Line, LineMetrics, PortfolioMix, SubscriptionHoursRollup, SubscriptionMetrics,
    Tier, TierMetrics,
};

/// Per-tier and line-level economics for the subscription mix. All tiers
/// share the same per-client hour budget.
pub fn subscription_metrics(
    assumptions: &AssumptionSet,
    mix: &PortfolioMix,
    cost_per_hour: f64,
) -> SubscriptionMetrics {
    let tiers = Tier::ALL
        .into_iter()
        .map(|tier| {
            tier_metrics(
                tier,
                assumptions.tier_price(tier),
                mix.tier_clients(tier),
                assumptions.hours_per_client,
                cost_per_hour,
            )
        })
        .collect::<Vec<_>>();

    let mut clients = 0u64;
    let mut revenue = 0.0;
    let mut hours = 0.0;
    let mut cost = 0.0;
    let mut margin = 0.0;
    for tier in &tiers {
        clients += u64::from(tier.clients);
        revenue += tier.revenue;
        hours += tier.hours;
        cost += tier.cost;
        margin += tier.margin;
    }

    // Rates come from the summed totals; averaging tier rates would overweight
    // tiers with few hours.
    let total = LineMetrics {
        line: Line::Subscription,
        clients,
        units: clients,
        revenue,
        hours,
        cost,
        margin,
        effective_rate: ratio(revenue, hours),
        margin_pct: ratio(margin, revenue),
    };

    SubscriptionMetrics { tiers, total }
}

fn tier_metrics(
    tier: Tier,
    price: f64,
    clients: u32,
    hours_per_client: f64,
    cost_per_hour: f64,
) -> TierMetrics {
    let count = f64::from(clients);
    let revenue = price * count;
    let hours = hours_per_client * count;
    let cost = hours * cost_per_hour;
    let margin = revenue - cost;
    TierMetrics {
        tier,
        name: tier.name(),
        price,
        clients,
        revenue,
        hours,
        cost,
        margin,
        effective_rate: ratio(revenue, hours),
        margin_pct: ratio(margin, revenue),
    }
}

/// Mean of the three tier prices, used where only a total client count is known.
pub fn average_tier_price(assumptions: &AssumptionSet) -> f64 {
    Tier::ALL
        .into_iter()
        .map(|tier| assumptions.tier_price(tier))
        .sum::<f64>()
        / Tier::ALL.len() as f64
}

pub fn subscription_hours_rollup(assumptions: &AssumptionSet) -> SubscriptionHoursRollup {
    let onboarding_hours =
        assumptions.onboarding_hours + assumptions.setup_hours + assumptions.training_hours;
    let ongoing_hours = assumptions.monthly_support_hours * 12.0
        + assumptions.quarterly_review_hours * 4.0
        + assumptions.annual_planning_hours;
    let total_hours = onboarding_hours + ongoing_hours;

    SubscriptionHoursRollup {
        onboarding_hours,
        ongoing_hours,
        total_hours,
        foundation_rate: ratio(assumptions.foundation_price, total_hours),
        growth_rate: ratio(assumptions.growth_price, total_hours),
        partnership_rate: ratio(assumptions.partnership_price, total_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn default_mix_tiers_and_totals() {
        let assumptions = AssumptionSet::default();
        let mix = PortfolioMix::from_assumptions(&assumptions);
        let metrics = subscription_metrics(&assumptions, &mix, 100.0);

        assert_eq!(metrics.tiers.len(), 3);
        let foundation = &metrics.tiers[0];
        assert_eq!(foundation.tier, Tier::Foundation);
        assert_approx(foundation.revenue, 24_000.0);
        assert_approx(foundation.hours, 134.0);
        assert_approx(foundation.cost, 13_400.0);
        assert_approx(foundation.margin, 10_600.0);

        let partnership = &metrics.tiers[2];
        assert_approx(partnership.revenue, 18_000.0);
        assert_approx(partnership.effective_rate, 18_000.0 / 67.0);

        assert_eq!(metrics.total.clients, 5);
        assert_approx(metrics.total.revenue, 72_000.0);
        assert_approx(metrics.total.hours, 335.0);
        assert_approx(metrics.total.cost, 33_500.0);
        assert_approx(metrics.total.margin, 38_500.0);
        assert_approx(metrics.total.effective_rate, 72_000.0 / 335.0);
        assert_approx(metrics.total.margin_pct, 38_500.0 / 72_000.0);
    }

    #[test]
    fn empty_tier_has_zero_ratios() {
        let assumptions = AssumptionSet {
            partnership_clients: 0,
            ..AssumptionSet::default()
        };
        let mix = PortfolioMix::from_assumptions(&assumptions);
        let metrics = subscription_metrics(&assumptions, &mix, 100.0);
        let partnership = &metrics.tiers[2];
        assert_eq!(partnership.revenue, 0.0);
        assert_eq!(partnership.effective_rate, 0.0);
        assert_eq!(partnership.margin_pct, 0.0);
    }

    #[test]
    fn line_rate_is_not_an_average_of_tier_rates() {
        let assumptions = AssumptionSet {
            foundation_clients: 4,
            growth_clients: 0,
            partnership_clients: 1,
            ..AssumptionSet::default()
        };
        let mix = PortfolioMix::from_assumptions(&assumptions);
        let metrics = subscription_metrics(&assumptions, &mix, 100.0);
        let expected = (4.0 * 12_000.0 + 18_000.0) / (5.0 * 67.0);
        assert_approx(metrics.total.effective_rate, expected);
    }

    #[test]
    fn average_price_is_mean_of_tiers() {
        assert_approx(average_tier_price(&AssumptionSet::default()), 15_000.0);
    }

    #[test]
    fn subscription_rollup_sums_onboarding_and_ongoing() {
        let rollup = subscription_hours_rollup(&AssumptionSet::default());
        assert_approx(rollup.onboarding_hours, 26.0);
        assert_approx(rollup.ongoing_hours, 36.0 + 8.0 + 3.0);
        assert_approx(rollup.total_hours, 73.0);
        assert_approx(rollup.growth_rate, 15_000.0 / 73.0);
    }

    proptest! {
        #[test]
        fn prop_line_rate_matches_totals(
            foundation in 0u32..20,
            growth in 0u32..20,
            partnership in 0u32..20,
            hours_per_client in 0u32..200
        ) {
            let assumptions = AssumptionSet {
                foundation_clients: foundation,
                growth_clients: growth,
                partnership_clients: partnership,
                hours_per_client: f64::from(hours_per_client),
                ..AssumptionSet::default()
            };
            let mix = PortfolioMix::from_assumptions(&assumptions);
            let total = subscription_metrics(&assumptions, &mix, 100.0).total;
            if total.hours > 0.0 {
                prop_assert_eq!(total.effective_rate, total.revenue / total.hours);
            } else {
                prop_assert_eq!(total.effective_rate, 0.0);
            }
            prop_assert!(total.margin_pct.is_finite());
        }
    }
}
