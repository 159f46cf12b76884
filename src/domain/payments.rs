//! Payment schedule domain types
//!
//! Milestones are percentages of the contract total. Templates per building
//! type produce a starting schedule; amounts are computed when a template is
//! applied and afterwards only on an explicit recompute.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric::{self, percent_of};

/// Allowed drift of the percentage total from 100.
pub const PERCENTAGE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Building type keys with a payment template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    #[default]
    DetachedHouse,
    HolidayHome,
    Garage,
    RowHouse,
}

impl BuildingType {
    pub const ALL: [BuildingType; 4] = [
        BuildingType::DetachedHouse,
        BuildingType::HolidayHome,
        BuildingType::Garage,
        BuildingType::RowHouse,
    ];
}

/// One row of a payment template.
#[derive(Debug, Clone, Serialize)]
pub struct MilestoneTemplate {
    pub order: u32,
    pub description: &'static str,
    pub trigger: &'static str,
    pub percentage: Decimal,
}

const fn row(
    order: u32,
    description: &'static str,
    trigger: &'static str,
    percentage: u32,
) -> MilestoneTemplate {
    MilestoneTemplate {
        order,
        description,
        trigger,
        percentage: Decimal::from_parts(percentage, 0, 0, false, 0),
    }
}

static DETACHED_HOUSE: [MilestoneTemplate; 5] = [
    row(1, "Down payment", "Contract signed", 10),
    row(2, "Design complete", "Element drawings approved", 10),
    row(3, "Elements delivered", "Element delivery to site", 40),
    row(4, "Shell complete", "Shell installation finished", 30),
    row(5, "Final payment", "Handover", 10),
];

static HOLIDAY_HOME: [MilestoneTemplate; 4] = [
    row(1, "Down payment", "Contract signed", 15),
    row(2, "Elements delivered", "Element delivery to site", 45),
    row(3, "Shell complete", "Shell installation finished", 30),
    row(4, "Final payment", "Handover", 10),
];

static GARAGE: [MilestoneTemplate; 3] = [
    row(1, "Down payment", "Contract signed", 20),
    row(2, "Elements delivered", "Element delivery to site", 60),
    row(3, "Final payment", "Handover", 20),
];

static ROW_HOUSE: [MilestoneTemplate; 6] = [
    row(1, "Down payment", "Contract signed", 5),
    row(2, "Design complete", "Building permit granted", 10),
    row(3, "First delivery", "First element delivery to site", 25),
    row(4, "Second delivery", "Final element delivery to site", 25),
    row(5, "Shell complete", "Shell installation finished", 25),
    row(6, "Final payment", "Handover", 10),
];

/// Ordered template rows for a building type.
pub fn template(building_type: BuildingType) -> &'static [MilestoneTemplate] {
    match building_type {
        BuildingType::DetachedHouse => &DETACHED_HOUSE,
        BuildingType::HolidayHome => &HOLIDAY_HOME,
        BuildingType::Garage => &GARAGE,
        BuildingType::RowHouse => &ROW_HOUSE,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMilestone {
    pub id: Uuid,
    pub order: u32,
    pub description: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub percentage: Decimal,
    /// Cached at template application or explicit recompute.
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub amount: Decimal,
}

/// Build milestones from a template against the current total.
pub fn apply_template(building_type: BuildingType, total_with_vat: Decimal) -> Vec<PaymentMilestone> {
    template(building_type)
        .iter()
        .map(|row| PaymentMilestone {
            id: Uuid::new_v4(),
            order: row.order,
            description: row.description.to_string(),
            trigger: row.trigger.to_string(),
            percentage: row.percentage,
            amount: percent_of(total_with_vat, row.percentage),
        })
        .collect()
}

/// Re-derive every cached amount from its percentage.
pub fn recompute_amounts(milestones: &mut [PaymentMilestone], total_with_vat: Decimal) {
    for milestone in milestones {
        milestone.amount = percent_of(total_with_vat, milestone.percentage);
    }
}

pub fn percentage_total(milestones: &[PaymentMilestone]) -> Decimal {
    numeric::sum(milestones.iter().map(|m| m.percentage))
}

/// Percentages add up to 100 within tolerance. Surfaced, never enforced.
pub fn is_valid(milestones: &[PaymentMilestone]) -> bool {
    percentage_total(milestones)
        .saturating_sub(Decimal::ONE_HUNDRED)
        .abs()
        <= PERCENTAGE_TOLERANCE
}

/// Schedule read model with validity and staleness indicators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentScheduleSummary {
    pub milestones: Vec<PaymentMilestone>,
    pub percentage_total: Decimal,
    pub amount_total: Decimal,
    pub total_with_vat: Decimal,
    pub is_valid: bool,
    /// Some cached amount no longer matches its percentage of the total.
    pub amounts_stale: bool,
}

impl PaymentScheduleSummary {
    pub fn new(milestones: &[PaymentMilestone], total_with_vat: Decimal) -> Self {
        let mut ordered = milestones.to_vec();
        ordered.sort_by_key(|m| m.order);

        let amounts_stale = ordered.iter().any(|m| {
            percent_of(total_with_vat, m.percentage)
                .saturating_sub(m.amount)
                .abs()
                > PERCENTAGE_TOLERANCE
        });

        Self {
            percentage_total: percentage_total(&ordered),
            amount_total: numeric::sum(ordered.iter().map(|m| m.amount)),
            total_with_vat,
            is_valid: is_valid(&ordered),
            amounts_stale,
            milestones: ordered,
        }
    }
}

/// Request DTO for applying a template
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyTemplateRequest {
    pub building_type: BuildingType,
}

/// Request DTO for adding a milestone
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMilestoneRequest {
    #[serde(default)]
    pub order: Option<u32>,
    pub description: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub percentage: Decimal,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub amount: Decimal,
}

/// Request DTO for updating a milestone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMilestoneRequest {
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub percentage: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub amount: Option<Decimal>,
}

impl PaymentMilestone {
    /// Plain field edit; a percentage change does not touch the amount.
    pub fn apply(&mut self, req: UpdateMilestoneRequest) {
        if let Some(order) = req.order {
            self.order = order;
        }
        if let Some(description) = req.description {
            self.description = description;
        }
        if let Some(trigger) = req.trigger {
            self.trigger = trigger;
        }
        if let Some(percentage) = req.percentage {
            self.percentage = percentage;
        }
        if let Some(amount) = req.amount {
            self.amount = amount;
        }
    }
}
