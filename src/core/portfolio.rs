use super::ratio::ratio;
use super::types::{LineMetrics, PortfolioMetrics, PortfolioStatus};

pub fn classify_status(hits_profit: bool, hits_hours: bool) -> PortfolioStatus {
    match (hits_profit, hits_hours) {
        (true, true) => PortfolioStatus::Green,
        (true, false) | (false, true) => PortfolioStatus::Amber,
        (false, false) => PortfolioStatus::Red,
    }
}

/// Combines both lines into portfolio totals and classifies them against the
/// profit target and the available hours.
pub fn aggregate(
    build_retain: &LineMetrics,
    subscription: &LineMetrics,
    capacity_hours: f64,
    profit_target: f64,
) -> PortfolioMetrics {
    let revenue = build_retain.revenue + subscription.revenue;
    let hours = build_retain.hours + subscription.hours;
    let cost = build_retain.cost + subscription.cost;
    let margin = build_retain.margin + subscription.margin;

    let hits_profit = margin >= profit_target;
    let hits_hours = hours <= capacity_hours;

    PortfolioMetrics {
        revenue,
        hours,
        cost,
        margin,
        effective_rate: ratio(revenue, hours),
        margin_pct: ratio(margin, revenue),
        capacity_hours,
        utilization_pct: ratio(hours, capacity_hours),
        profit_target,
        hits_profit,
        hits_hours,
        status: classify_status(hits_profit, hits_hours),
        ai_share: ratio(build_retain.revenue, revenue),
        np_share: ratio(subscription.revenue, revenue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Line;
    use proptest::prelude::{prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn line(line: Line, revenue: f64, hours: f64, cost_per_hour: f64) -> LineMetrics {
        let cost = hours * cost_per_hour;
        let margin = revenue - cost;
        LineMetrics {
            line,
            clients: 1,
            units: 1,
            revenue,
            hours,
            cost,
            margin,
            effective_rate: ratio(revenue, hours),
            margin_pct: ratio(margin, revenue),
        }
    }

    #[test]
    fn profit_hit_with_hours_over_capacity_is_amber() {
        // margin 150k on 1 200 hours against a 140k target and 1 150 hours
        let ai = line(Line::BuildRetain, 270_000.0, 1_200.0, 100.0);
        let np = line(Line::Subscription, 0.0, 0.0, 100.0);
        let metrics = aggregate(&ai, &np, 1_150.0, 140_000.0);

        assert_approx(metrics.margin, 150_000.0);
        assert!(metrics.hits_profit);
        assert!(!metrics.hits_hours);
        assert_eq!(metrics.status, PortfolioStatus::Amber);
    }

    #[test]
    fn status_flips_through_all_three_levels() {
        assert_eq!(classify_status(true, true), PortfolioStatus::Green);
        assert_eq!(classify_status(false, true), PortfolioStatus::Amber);
        assert_eq!(classify_status(true, false), PortfolioStatus::Amber);
        assert_eq!(classify_status(false, false), PortfolioStatus::Red);
    }

    #[test]
    fn boundary_values_count_as_hits() {
        let ai = line(Line::BuildRetain, 255_000.0, 1_150.0, 100.0);
        let np = line(Line::Subscription, 0.0, 0.0, 100.0);
        let metrics = aggregate(&ai, &np, 1_150.0, 140_000.0);
        assert_approx(metrics.margin, 140_000.0);
        assert_eq!(metrics.status, PortfolioStatus::Green);
        assert_approx(metrics.utilization_pct, 1.0);
    }

    #[test]
    fn shares_split_revenue_between_lines() {
        let ai = line(Line::BuildRetain, 90_000.0, 280.0, 100.0);
        let np = line(Line::Subscription, 72_000.0, 335.0, 100.0);
        let metrics = aggregate(&ai, &np, 1_150.0, 140_000.0);

        assert_approx(metrics.revenue, 162_000.0);
        assert_approx(metrics.hours, 615.0);
        assert_approx(metrics.cost, 61_500.0);
        assert_approx(metrics.margin, 100_500.0);
        assert_approx(metrics.ai_share, 90_000.0 / 162_000.0);
        assert_approx(metrics.np_share, 72_000.0 / 162_000.0);
        assert_approx(metrics.utilization_pct, 615.0 / 1_150.0);
        assert_eq!(metrics.status, PortfolioStatus::Amber);
    }

    #[test]
    fn empty_portfolio_has_zero_ratios() {
        let ai = line(Line::BuildRetain, 0.0, 0.0, 100.0);
        let np = line(Line::Subscription, 0.0, 0.0, 100.0);
        let metrics = aggregate(&ai, &np, 0.0, 140_000.0);
        assert_eq!(metrics.effective_rate, 0.0);
        assert_eq!(metrics.margin_pct, 0.0);
        assert_eq!(metrics.utilization_pct, 0.0);
        assert_eq!(metrics.ai_share, 0.0);
        assert_eq!(metrics.np_share, 0.0);
        assert_eq!(metrics.status, PortfolioStatus::Amber);
    }

    proptest! {
        #[test]
        fn prop_status_matches_both_checks(
            ai_revenue in 0u32..400_000,
            ai_hours in 0u32..2_000,
            np_revenue in 0u32..400_000,
            np_hours in 0u32..2_000,
            capacity in 0u32..3_000,
            target in 0u32..300_000
        ) {
            let ai = line(Line::BuildRetain, f64::from(ai_revenue), f64::from(ai_hours), 100.0);
            let np = line(Line::Subscription, f64::from(np_revenue), f64::from(np_hours), 100.0);
            let metrics = aggregate(&ai, &np, f64::from(capacity), f64::from(target));

            let profit = metrics.margin >= f64::from(target);
            let fits = metrics.hours <= f64::from(capacity);
            let expected = match (profit, fits) {
                (true, true) => PortfolioStatus::Green,
                (false, false) => PortfolioStatus::Red,
                _ => PortfolioStatus::Amber,
            };
            prop_assert_eq!(metrics.status, expected);
            if metrics.hours > 0.0 {
                prop_assert_eq!(metrics.effective_rate, metrics.revenue / metrics.hours);
            } else {
                prop_assert_eq!(metrics.effective_rate, 0.0);
            }
        }
    }
}
