use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::EngineError;

/// Number of workflows a build-and-retain client buys. The retainer schedule
/// only prices these three sizes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum UnitsPerClient {
    One,
    Two,
    Three,
}

impl UnitsPerClient {
    pub fn count(self) -> u32 {
        match self {
            UnitsPerClient::One => 1,
            UnitsPerClient::Two => 2,
            UnitsPerClient::Three => 3,
        }
    }
}

impl TryFrom<u32> for UnitsPerClient {
    type Error = EngineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UnitsPerClient::One),
            2 => Ok(UnitsPerClient::Two),
            3 => Ok(UnitsPerClient::Three),
            other => Err(EngineError::UnsupportedUnitsPerClient(f64::from(other))),
        }
    }
}

impl From<UnitsPerClient> for u32 {
    fn from(value: UnitsPerClient) -> Self {
        value.count()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tier {
    Foundation,
    Growth,
    Partnership,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Foundation, Tier::Growth, Tier::Partnership];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Foundation => "Foundation",
            Tier::Growth => "Growth",
            Tier::Partnership => "Partnership",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Line {
    #[serde(alias = "buildRetain", alias = "build_retain", alias = "ai")]
    BuildRetain,
    #[serde(alias = "np")]
    Subscription,
}

impl FromStr for Line {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build-retain" | "buildRetain" | "build_retain" | "ai" => Ok(Line::BuildRetain),
            "subscription" | "np" => Ok(Line::Subscription),
            other => Err(EngineError::UnknownLine(other.to_string())),
        }
    }
}

/// Every tunable assumption, addressable one at a time by the UI.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    HourlyCost,
    WorkingWeeksPerYear,
    WorkingHoursPerWeek,
    ProfitTarget,

    BuildPrice,
    DepositPerUnit,
    BuildHoursPerUnit,
    RetainerOneUnit,
    RetainerTwoUnits,
    RetainerThreeUnits,
    MaintenanceHoursPerMonth,
    EngagementMonths,
    BuildPhaseMonths,

    DiscoveryHours,
    DesignHours,
    ImplementationHours,
    TestingHours,
    DocumentationHours,
    MonthlyMaintenanceHours,

    FoundationPrice,
    GrowthPrice,
    PartnershipPrice,
    HoursPerClient,

    OnboardingHours,
    SetupHours,
    TrainingHours,
    MonthlySupportHours,
    QuarterlyReviewHours,
    AnnualPlanningHours,

    TeamEnabled,
    TeamMembers,
    TeamHourlyCost,
    TeamHoursPerMember,
    ManagementHoursPerMember,

    AiClients,
    UnitsPerClient,
    FoundationClients,
    GrowthClients,
    PartnershipClients,
}

/// Typed location of one assumption inside [`AssumptionSet`].
enum Slot<'a> {
    Flag(&'a mut bool),
    Units(&'a mut UnitsPerClient),
    Count(&'a mut u32),
    Amount(&'a mut f64),
}

impl Field {
    pub const ALL: [Field; 39] = [
        Field::HourlyCost,
        Field::WorkingWeeksPerYear,
        Field::WorkingHoursPerWeek,
        Field::ProfitTarget,
        Field::BuildPrice,
        Field::DepositPerUnit,
        Field::BuildHoursPerUnit,
        Field::RetainerOneUnit,
        Field::RetainerTwoUnits,
        Field::RetainerThreeUnits,
        Field::MaintenanceHoursPerMonth,
        Field::EngagementMonths,
        Field::BuildPhaseMonths,
        Field::DiscoveryHours,
        Field::DesignHours,
        Field::ImplementationHours,
        Field::TestingHours,
        Field::DocumentationHours,
        Field::MonthlyMaintenanceHours,
        Field::FoundationPrice,
        Field::GrowthPrice,
        Field::PartnershipPrice,
        Field::HoursPerClient,
        Field::OnboardingHours,
        Field::SetupHours,
        Field::TrainingHours,
        Field::MonthlySupportHours,
        Field::QuarterlyReviewHours,
        Field::AnnualPlanningHours,
        Field::TeamEnabled,
        Field::TeamMembers,
        Field::TeamHourlyCost,
        Field::TeamHoursPerMember,
        Field::ManagementHoursPerMember,
        Field::AiClients,
        Field::UnitsPerClient,
        Field::FoundationClients,
        Field::GrowthClients,
        Field::PartnershipClients,
    ];

    /// Fields describing the portfolio mix; scenarios and grid selection
    /// only ever write these.
    pub const MIX: [Field; 5] = [
        Field::AiClients,
        Field::UnitsPerClient,
        Field::FoundationClients,
        Field::GrowthClients,
        Field::PartnershipClients,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::HourlyCost => "hourlyCost",
            Field::WorkingWeeksPerYear => "workingWeeksPerYear",
            Field::WorkingHoursPerWeek => "workingHoursPerWeek",
            Field::ProfitTarget => "profitTarget",
            Field::BuildPrice => "buildPrice",
            Field::DepositPerUnit => "depositPerUnit",
            Field::BuildHoursPerUnit => "buildHoursPerUnit",
            Field::RetainerOneUnit => "retainerOneUnit",
            Field::RetainerTwoUnits => "retainerTwoUnits",
            Field::RetainerThreeUnits => "retainerThreeUnits",
            Field::MaintenanceHoursPerMonth => "maintenanceHoursPerMonth",
            Field::EngagementMonths => "engagementMonths",
            Field::BuildPhaseMonths => "buildPhaseMonths",
            Field::DiscoveryHours => "discoveryHours",
            Field::DesignHours => "designHours",
            Field::ImplementationHours => "implementationHours",
            Field::TestingHours => "testingHours",
            Field::DocumentationHours => "documentationHours",
            Field::MonthlyMaintenanceHours => "monthlyMaintenanceHours",
            Field::FoundationPrice => "foundationPrice",
            Field::GrowthPrice => "growthPrice",
            Field::PartnershipPrice => "partnershipPrice",
            Field::HoursPerClient => "hoursPerClient",
            Field::OnboardingHours => "onboardingHours",
            Field::SetupHours => "setupHours",
            Field::TrainingHours => "trainingHours",
            Field::MonthlySupportHours => "monthlySupportHours",
            Field::QuarterlyReviewHours => "quarterlyReviewHours",
            Field::AnnualPlanningHours => "annualPlanningHours",
            Field::TeamEnabled => "teamEnabled",
            Field::TeamMembers => "teamMembers",
            Field::TeamHourlyCost => "teamHourlyCost",
            Field::TeamHoursPerMember => "teamHoursPerMember",
            Field::ManagementHoursPerMember => "managementHoursPerMember",
            Field::AiClients => "aiClients",
            Field::UnitsPerClient => "unitsPerClient",
            Field::FoundationClients => "foundationClients",
            Field::GrowthClients => "growthClients",
            Field::PartnershipClients => "partnershipClients",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| EngineError::UnknownField(s.to_string()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<UnitsPerClient> for FieldValue {
    fn from(value: UnitsPerClient) -> Self {
        FieldValue::Number(f64::from(value.count()))
    }
}

impl FromStr for FieldValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "on" => Ok(FieldValue::Flag(true)),
            "false" | "off" => Ok(FieldValue::Flag(false)),
            other => other
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| format!("`{other}` is not a number or flag")),
        }
    }
}

/// The complete set of tunable inputs. Every derived figure is a function of
/// one snapshot of this record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssumptionSet {
    pub hourly_cost: f64,
    pub working_weeks_per_year: f64,
    pub working_hours_per_week: f64,
    pub profit_target: f64,

    pub build_price: f64,
    pub deposit_per_unit: f64,
    pub build_hours_per_unit: f64,
    pub retainer_one_unit: f64,
    pub retainer_two_units: f64,
    pub retainer_three_units: f64,
    pub maintenance_hours_per_month: f64,
    pub engagement_months: u32,
    pub build_phase_months: u32,

    pub discovery_hours: f64,
    pub design_hours: f64,
    pub implementation_hours: f64,
    pub testing_hours: f64,
    pub documentation_hours: f64,
    pub monthly_maintenance_hours: f64,

    pub foundation_price: f64,
    pub growth_price: f64,
    pub partnership_price: f64,
    pub hours_per_client: f64,

    pub onboarding_hours: f64,
    pub setup_hours: f64,
    pub training_hours: f64,
    pub monthly_support_hours: f64,
    pub quarterly_review_hours: f64,
    pub annual_planning_hours: f64,

    pub team_enabled: bool,
    pub team_members: u32,
    pub team_hourly_cost: f64,
    pub team_hours_per_member: f64,
    pub management_hours_per_member: f64,

    pub ai_clients: u32,
    pub units_per_client: UnitsPerClient,
    pub foundation_clients: u32,
    pub growth_clients: u32,
    pub partnership_clients: u32,
}

impl Default for AssumptionSet {
    fn default() -> Self {
        Self {
            hourly_cost: 100.0,
            working_weeks_per_year: 46.0,
            working_hours_per_week: 25.0,
            profit_target: 140_000.0,
            build_price: 15_000.0,
            deposit_per_unit: 2_000.0,
            build_hours_per_unit: 80.0,
            retainer_one_unit: 3_000.0,
            retainer_two_units: 5_000.0,
            retainer_three_units: 7_500.0,
            maintenance_hours_per_month: 6.0,
            engagement_months: 12,
            build_phase_months: 2,
            discovery_hours: 8.0,
            design_hours: 16.0,
            implementation_hours: 40.0,
            testing_hours: 10.0,
            documentation_hours: 6.0,
            monthly_maintenance_hours: 6.0,
            foundation_price: 12_000.0,
            growth_price: 15_000.0,
            partnership_price: 18_000.0,
            hours_per_client: 67.0,
            onboarding_hours: 12.0,
            setup_hours: 8.0,
            training_hours: 6.0,
            monthly_support_hours: 3.0,
            quarterly_review_hours: 2.0,
            annual_planning_hours: 3.0,
            team_enabled: false,
            team_members: 1,
            team_hourly_cost: 50.0,
            team_hours_per_member: 1_000.0,
            management_hours_per_member: 80.0,
            ai_clients: 2,
            units_per_client: UnitsPerClient::One,
            foundation_clients: 2,
            growth_clients: 2,
            partnership_clients: 1,
        }
    }
}

impl AssumptionSet {
    /// Monthly retainer paid by a client with the given number of units.
    pub fn retainer(&self, units: UnitsPerClient) -> f64 {
        match units {
            UnitsPerClient::One => self.retainer_one_unit,
            UnitsPerClient::Two => self.retainer_two_units,
            UnitsPerClient::Three => self.retainer_three_units,
        }
    }

    pub fn tier_price(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Foundation => self.foundation_price,
            Tier::Growth => self.growth_price,
            Tier::Partnership => self.partnership_price,
        }
    }

    pub fn tier_clients(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Foundation => self.foundation_clients,
            Tier::Growth => self.growth_clients,
            Tier::Partnership => self.partnership_clients,
        }
    }

    pub fn maintenance_months(&self) -> u32 {
        self.engagement_months.saturating_sub(self.build_phase_months)
    }

    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::HourlyCost => self.hourly_cost.into(),
            Field::WorkingWeeksPerYear => self.working_weeks_per_year.into(),
            Field::WorkingHoursPerWeek => self.working_hours_per_week.into(),
            Field::ProfitTarget => self.profit_target.into(),
            Field::BuildPrice => self.build_price.into(),
            Field::DepositPerUnit => self.deposit_per_unit.into(),
            Field::BuildHoursPerUnit => self.build_hours_per_unit.into(),
            Field::RetainerOneUnit => self.retainer_one_unit.into(),
            Field::RetainerTwoUnits => self.retainer_two_units.into(),
            Field::RetainerThreeUnits => self.retainer_three_units.into(),
            Field::MaintenanceHoursPerMonth => self.maintenance_hours_per_month.into(),
            Field::EngagementMonths => self.engagement_months.into(),
            Field::BuildPhaseMonths => self.build_phase_months.into(),
            Field::DiscoveryHours => self.discovery_hours.into(),
            Field::DesignHours => self.design_hours.into(),
            Field::ImplementationHours => self.implementation_hours.into(),
            Field::TestingHours => self.testing_hours.into(),
            Field::DocumentationHours => self.documentation_hours.into(),
            Field::MonthlyMaintenanceHours => self.monthly_maintenance_hours.into(),
            Field::FoundationPrice => self.foundation_price.into(),
            Field::GrowthPrice => self.growth_price.into(),
            Field::PartnershipPrice => self.partnership_price.into(),
            Field::HoursPerClient => self.hours_per_client.into(),
            Field::OnboardingHours => self.onboarding_hours.into(),
            Field::SetupHours => self.setup_hours.into(),
            Field::TrainingHours => self.training_hours.into(),
            Field::MonthlySupportHours => self.monthly_support_hours.into(),
            Field::QuarterlyReviewHours => self.quarterly_review_hours.into(),
            Field::AnnualPlanningHours => self.annual_planning_hours.into(),
            Field::TeamEnabled => self.team_enabled.into(),
            Field::TeamMembers => self.team_members.into(),
            Field::TeamHourlyCost => self.team_hourly_cost.into(),
            Field::TeamHoursPerMember => self.team_hours_per_member.into(),
            Field::ManagementHoursPerMember => self.management_hours_per_member.into(),
            Field::AiClients => self.ai_clients.into(),
            Field::UnitsPerClient => self.units_per_client.into(),
            Field::FoundationClients => self.foundation_clients.into(),
            Field::GrowthClients => self.growth_clients.into(),
            Field::PartnershipClients => self.partnership_clients.into(),
        }
    }

    /// Replaces one field. Counts must be whole and non-negative, and
    /// units-per-client must be one of the priced sizes; everything else is
    /// accepted as given.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<(), EngineError> {
        match self.slot_mut(field) {
            Slot::Flag(slot) => *slot = expect_flag(field, value)?,
            Slot::Units(slot) => *slot = units_from_number(expect_number(field, value)?)?,
            Slot::Count(slot) => *slot = count_from_number(field, expect_number(field, value)?)?,
            Slot::Amount(slot) => *slot = expect_number(field, value)?,
        }
        Ok(())
    }

    fn slot_mut(&mut self, field: Field) -> Slot<'_> {
        match field {
            Field::HourlyCost => Slot::Amount(&mut self.hourly_cost),
            Field::WorkingWeeksPerYear => Slot::Amount(&mut self.working_weeks_per_year),
            Field::WorkingHoursPerWeek => Slot::Amount(&mut self.working_hours_per_week),
            Field::ProfitTarget => Slot::Amount(&mut self.profit_target),
            Field::BuildPrice => Slot::Amount(&mut self.build_price),
            Field::DepositPerUnit => Slot::Amount(&mut self.deposit_per_unit),
            Field::BuildHoursPerUnit => Slot::Amount(&mut self.build_hours_per_unit),
            Field::RetainerOneUnit => Slot::Amount(&mut self.retainer_one_unit),
            Field::RetainerTwoUnits => Slot::Amount(&mut self.retainer_two_units),
            Field::RetainerThreeUnits => Slot::Amount(&mut self.retainer_three_units),
            Field::MaintenanceHoursPerMonth => Slot::Amount(&mut self.maintenance_hours_per_month),
            Field::EngagementMonths => Slot::Count(&mut self.engagement_months),
            Field::BuildPhaseMonths => Slot::Count(&mut self.build_phase_months),
            Field::DiscoveryHours => Slot::Amount(&mut self.discovery_hours),
            Field::DesignHours => Slot::Amount(&mut self.design_hours),
            Field::ImplementationHours => Slot::Amount(&mut self.implementation_hours),
            Field::TestingHours => Slot::Amount(&mut self.testing_hours),
            Field::DocumentationHours => Slot::Amount(&mut self.documentation_hours),
            Field::MonthlyMaintenanceHours => Slot::Amount(&mut self.monthly_maintenance_hours),
            Field::FoundationPrice => Slot::Amount(&mut self.foundation_price),
            Field::GrowthPrice => Slot::Amount(&mut self.growth_price),
            Field::PartnershipPrice => Slot::Amount(&mut self.partnership_price),
            Field::HoursPerClient => Slot::Amount(&mut self.hours_per_client),
            Field::OnboardingHours => Slot::Amount(&mut self.onboarding_hours),
            Field::SetupHours => Slot::Amount(&mut self.setup_hours),
            Field::TrainingHours => Slot::Amount(&mut self.training_hours),
            Field::MonthlySupportHours => Slot::Amount(&mut self.monthly_support_hours),
            Field::QuarterlyReviewHours => Slot::Amount(&mut self.quarterly_review_hours),
            Field::AnnualPlanningHours => Slot::Amount(&mut self.annual_planning_hours),
            Field::TeamEnabled => Slot::Flag(&mut self.team_enabled),
            Field::TeamMembers => Slot::Count(&mut self.team_members),
            Field::TeamHourlyCost => Slot::Amount(&mut self.team_hourly_cost),
            Field::TeamHoursPerMember => Slot::Amount(&mut self.team_hours_per_member),
            Field::ManagementHoursPerMember => Slot::Amount(&mut self.management_hours_per_member),
            Field::AiClients => Slot::Count(&mut self.ai_clients),
            Field::UnitsPerClient => Slot::Units(&mut self.units_per_client),
            Field::FoundationClients => Slot::Count(&mut self.foundation_clients),
            Field::GrowthClients => Slot::Count(&mut self.growth_clients),
            Field::PartnershipClients => Slot::Count(&mut self.partnership_clients),
        }
    }
}

fn expect_flag(field: Field, value: FieldValue) -> Result<bool, EngineError> {
    match value {
        FieldValue::Flag(flag) => Ok(flag),
        FieldValue::Number(_) => Err(EngineError::ValueKind {
            field,
            expected: "a flag",
        }),
    }
}

fn expect_number(field: Field, value: FieldValue) -> Result<f64, EngineError> {
    match value {
        FieldValue::Number(number) => Ok(number),
        FieldValue::Flag(_) => Err(EngineError::ValueKind {
            field,
            expected: "a number",
        }),
    }
}

fn count_from_number(field: Field, value: f64) -> Result<u32, EngineError> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(EngineError::InvalidCount { field, value });
    }
    Ok(value as u32)
}

fn units_from_number(value: f64) -> Result<UnitsPerClient, EngineError> {
    if value == 1.0 {
        Ok(UnitsPerClient::One)
    } else if value == 2.0 {
        Ok(UnitsPerClient::Two)
    } else if value == 3.0 {
        Ok(UnitsPerClient::Three)
    } else {
        Err(EngineError::UnsupportedUnitsPerClient(value))
    }
}

/// Portfolio health against the profit target and the hours ceiling.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioStatus {
    Green,
    Amber,
    Red,
}

/// Grid cells distinguish which of the two checks failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GridStatus {
    Green,
    OverHours,
    UnderProfit,
    Red,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Phase {
    Build,
    Maintain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityResult {
    pub total_capacity_hours: f64,
    pub self_delivery_hours: f64,
    pub team_delivery_hours: f64,
    pub management_overhead_hours: f64,
    pub blended_cost_per_hour: f64,
    pub team_cost: f64,
    pub self_cost: f64,
}

/// Economics of one build-and-retain unit over a full engagement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomics {
    pub units_per_client: UnitsPerClient,
    pub maintenance_months: u32,
    pub build_revenue: f64,
    pub maintenance_revenue: f64,
    pub total_revenue: f64,
    pub build_hours: f64,
    pub maintenance_hours: f64,
    pub total_hours: f64,
    pub effective_rate: f64,
    pub cost: f64,
    pub gross_margin: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMonth {
    pub month_index: u32,
    pub label: String,
    pub phase: Phase,
    pub revenue: f64,
    pub hours: f64,
    pub display_revenue: i64,
    pub display_hours: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub units_per_client: UnitsPerClient,
    pub months: Vec<TimelineMonth>,
    pub total_revenue: f64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMetrics {
    pub line: Line,
    pub clients: u64,
    /// Billable units: workflows for the build line, clients for subscriptions.
    pub units: u64,
    pub revenue: f64,
    pub hours: f64,
    pub cost: f64,
    pub margin: f64,
    pub effective_rate: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierMetrics {
    pub tier: Tier,
    pub name: &'static str,
    pub price: f64,
    pub clients: u32,
    pub revenue: f64,
    pub hours: f64,
    pub cost: f64,
    pub margin: f64,
    pub effective_rate: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionMetrics {
    pub tiers: Vec<TierMetrics>,
    pub total: LineMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub revenue: f64,
    pub hours: f64,
    pub cost: f64,
    pub margin: f64,
    pub effective_rate: f64,
    pub margin_pct: f64,
    pub capacity_hours: f64,
    pub utilization_pct: f64,
    pub profit_target: f64,
    pub hits_profit: bool,
    pub hits_hours: bool,
    pub status: PortfolioStatus,
    pub ai_share: f64,
    pub np_share: f64,
}

/// Client counts for one portfolio configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMix {
    pub ai_clients: u32,
    /// Zero means the mix carries no build-and-retain work at all.
    pub units_per_client: u32,
    pub foundation_clients: u32,
    pub growth_clients: u32,
    pub partnership_clients: u32,
}

impl PortfolioMix {
    pub fn from_assumptions(assumptions: &AssumptionSet) -> Self {
        Self {
            ai_clients: assumptions.ai_clients,
            units_per_client: assumptions.units_per_client.count(),
            foundation_clients: assumptions.foundation_clients,
            growth_clients: assumptions.growth_clients,
            partnership_clients: assumptions.partnership_clients,
        }
    }

    pub fn tier_clients(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Foundation => self.foundation_clients,
            Tier::Growth => self.growth_clients,
            Tier::Partnership => self.partnership_clients,
        }
    }

    pub fn subscription_clients(&self) -> u64 {
        u64::from(self.foundation_clients)
            + u64::from(self.growth_clients)
            + u64::from(self.partnership_clients)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Preset,
    Current,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub name: String,
    pub description: String,
    pub kind: ScenarioKind,
    pub mix: PortfolioMix,
    pub build_retain: LineMetrics,
    pub subscription: LineMetrics,
    pub metrics: PortfolioMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub ai: u32,
    pub np: u32,
    pub revenue: f64,
    pub hours: f64,
    pub cost: f64,
    pub margin: f64,
    pub effective_rate: f64,
    pub margin_pct: f64,
    pub status: GridStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityGrid {
    pub max_ai: u32,
    pub max_np: u32,
    pub average_tier_price: f64,
    /// Row-major: `cells[ai][np]`.
    pub cells: Vec<Vec<GridCell>>,
}

impl SensitivityGrid {
    pub fn cell(&self, ai: u32, np: u32) -> Option<&GridCell> {
        self.cells.get(ai as usize)?.get(np as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildHoursRollup {
    pub build_hours: f64,
    pub maintenance_hours_per_month: f64,
    pub maintenance_hours: f64,
    pub total_hours: f64,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionHoursRollup {
    pub onboarding_hours: f64,
    pub ongoing_hours: f64,
    pub total_hours: f64,
    pub foundation_rate: f64,
    pub growth_rate: f64,
    pub partnership_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_accepts_its_current_value() {
        let defaults = AssumptionSet::default();
        let mut assumptions = AssumptionSet::default();
        for field in Field::ALL {
            assumptions
                .set(field, defaults.get(field))
                .unwrap_or_else(|err| panic!("{field}: {err}"));
        }
        assert_eq!(assumptions, defaults);
    }

    #[test]
    fn every_field_rejects_the_other_value_kind() {
        let mut assumptions = AssumptionSet::default();
        for field in Field::ALL {
            let wrong = match assumptions.get(field) {
                FieldValue::Flag(_) => FieldValue::Number(1.0),
                FieldValue::Number(_) => FieldValue::Flag(true),
            };
            assert!(
                matches!(
                    assumptions.set(field, wrong),
                    Err(EngineError::ValueKind { field: f, .. }) if f == field
                ),
                "{field} accepted a mismatched value"
            );
        }
        assert_eq!(assumptions, AssumptionSet::default());
    }

    #[test]
    fn set_writes_the_named_field() {
        let mut assumptions = AssumptionSet::default();
        assumptions
            .set(Field::ManagementHoursPerMember, 120.0.into())
            .expect("amount");
        assumptions.set(Field::BuildPhaseMonths, 3u32.into()).expect("count");
        assumptions
            .set(Field::UnitsPerClient, UnitsPerClient::Two.into())
            .expect("units");
        assumptions.set(Field::TeamEnabled, true.into()).expect("flag");

        assert_eq!(assumptions.management_hours_per_member, 120.0);
        assert_eq!(assumptions.build_phase_months, 3);
        assert_eq!(assumptions.units_per_client, UnitsPerClient::Two);
        assert!(assumptions.team_enabled);
        assert_eq!(assumptions.maintenance_months(), 9);
    }

    #[test]
    fn counts_accept_the_full_u32_range() {
        let mut assumptions = AssumptionSet::default();
        assumptions
            .set(Field::GrowthClients, u32::MAX.into())
            .expect("largest count");
        assert_eq!(assumptions.growth_clients, u32::MAX);
        assert!(matches!(
            assumptions.set(Field::GrowthClients, FieldValue::Number(f64::from(u32::MAX) + 1.0)),
            Err(EngineError::InvalidCount { .. })
        ));
    }
}
