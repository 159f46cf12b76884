//! Pricing engine
//!
//! Derives selling prices, VAT and profit from the raw cost inputs of a
//! quotation. Markup and commission are both percentages of the *selling
//! price*, so `cost = price * (1 - markup% - commission%)` is inverted to
//! solve for the price.
//!
//! `compute_pricing` is pure and total: every read is coerced, negative
//! inputs are clamped at zero and a degenerate divisor is floored instead of
//! producing an infinite or negative price.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::assembly;
use super::numeric::{self, non_negative, percent_of};
use super::quotation::Quotation;

/// Standard Finnish VAT rate.
pub const STANDARD_VAT_PERCENT: Decimal = Decimal::from_parts(255, 0, 0, false, 1);

/// Smallest divisor used when markup + commission reaches 100%.
pub const DIVISOR_FLOOR: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

pub const DEFAULT_COMMISSION_PERCENT: Decimal = Decimal::from_parts(4, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostCategory {
    Elements,
    Trusses,
    WindowsDoors,
    WorksiteDeliveries,
    Installation,
    Transportation,
    Design,
}

impl CostCategory {
    pub const ALL: [CostCategory; 7] = [
        CostCategory::Elements,
        CostCategory::Trusses,
        CostCategory::WindowsDoors,
        CostCategory::WorksiteDeliveries,
        CostCategory::Installation,
        CostCategory::Transportation,
        CostCategory::Design,
    ];

    /// Markup applied when the quotation has no value for this category.
    pub fn default_markup(self) -> Decimal {
        let percent = match self {
            Self::Elements => 22,
            Self::Trusses => 20,
            Self::WindowsDoors => 18,
            Self::WorksiteDeliveries => 15,
            Self::Installation => 28,
            Self::Transportation => 12,
            Self::Design => 25,
        };
        Decimal::from(percent)
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Elements => "elements",
            Self::Trusses => "trusses",
            Self::WindowsDoors => "windowsDoors",
            Self::WorksiteDeliveries => "worksiteDeliveries",
            Self::Installation => "installation",
            Self::Transportation => "transportation",
            Self::Design => "design",
        };
        f.write_str(name)
    }
}

/// Markup percent per category. All seven keys are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCategoryMarkups")]
pub struct CategoryMarkups {
    pub elements: Decimal,
    pub trusses: Decimal,
    pub windows_doors: Decimal,
    pub worksite_deliveries: Decimal,
    pub installation: Decimal,
    pub transportation: Decimal,
    pub design: Decimal,
}

impl CategoryMarkups {
    pub fn get(&self, category: CostCategory) -> Decimal {
        match category {
            CostCategory::Elements => self.elements,
            CostCategory::Trusses => self.trusses,
            CostCategory::WindowsDoors => self.windows_doors,
            CostCategory::WorksiteDeliveries => self.worksite_deliveries,
            CostCategory::Installation => self.installation,
            CostCategory::Transportation => self.transportation,
            CostCategory::Design => self.design,
        }
    }

    pub fn set(&mut self, category: CostCategory, percent: Decimal) {
        let slot = match category {
            CostCategory::Elements => &mut self.elements,
            CostCategory::Trusses => &mut self.trusses,
            CostCategory::WindowsDoors => &mut self.windows_doors,
            CostCategory::WorksiteDeliveries => &mut self.worksite_deliveries,
            CostCategory::Installation => &mut self.installation,
            CostCategory::Transportation => &mut self.transportation,
            CostCategory::Design => &mut self.design,
        };
        *slot = percent;
    }
}

impl Default for CategoryMarkups {
    fn default() -> Self {
        RawCategoryMarkups::default().into()
    }
}

/// Wire shape of the markup map; unset or non-numeric entries take the
/// category default.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategoryMarkups {
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    elements: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    trusses: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    windows_doors: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    worksite_deliveries: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    installation: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    transportation: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    design: Option<Decimal>,
}

impl From<RawCategoryMarkups> for CategoryMarkups {
    fn from(raw: RawCategoryMarkups) -> Self {
        let pick = |value: Option<Decimal>, category: CostCategory| {
            value.unwrap_or_else(|| category.default_markup())
        };
        Self {
            elements: pick(raw.elements, CostCategory::Elements),
            trusses: pick(raw.trusses, CostCategory::Trusses),
            windows_doors: pick(raw.windows_doors, CostCategory::WindowsDoors),
            worksite_deliveries: pick(raw.worksite_deliveries, CostCategory::WorksiteDeliveries),
            installation: pick(raw.installation, CostCategory::Installation),
            transportation: pick(raw.transportation, CostCategory::Transportation),
            design: pick(raw.design, CostCategory::Design),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatMode {
    #[default]
    Standard,
    /// Reverse-charge construction service: the buyer self-assesses VAT.
    ConstructionService,
}

impl VatMode {
    pub fn percentage(self) -> Decimal {
        match self {
            Self::Standard => STANDARD_VAT_PERCENT,
            Self::ConstructionService => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingSettings {
    #[serde(default)]
    pub category_markups: CategoryMarkups,
    /// Unset, null or non-numeric reads as the default commission.
    #[serde(default = "default_commission", deserialize_with = "commission_or_default")]
    pub commission_percentage: Decimal,
    #[serde(default)]
    pub vat_mode: VatMode,
}

fn default_commission() -> Decimal {
    DEFAULT_COMMISSION_PERCENT
}

fn commission_or_default<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(numeric::optional_decimal(deserializer)?.unwrap_or(DEFAULT_COMMISSION_PERCENT))
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            category_markups: CategoryMarkups::default(),
            commission_percentage: DEFAULT_COMMISSION_PERCENT,
            vat_mode: VatMode::Standard,
        }
    }
}

/// Derived price of one cost category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPricing {
    pub cost: Decimal,
    pub markup_percent: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    /// Markup plus commission reached 100% and the divisor floor was used.
    pub is_degenerate_markup: bool,
}

impl CategoryPricing {
    /// Invert `cost = price * (1 - markup% - commission%)`.
    pub fn derive(cost: Decimal, markup_percent: Decimal, commission_percent: Decimal) -> Self {
        let divisor = Decimal::ONE
            .saturating_sub(markup_percent / Decimal::ONE_HUNDRED)
            .saturating_sub(commission_percent / Decimal::ONE_HUNDRED);
        let is_degenerate_markup = divisor <= Decimal::ZERO;
        let divisor = if is_degenerate_markup { DIVISOR_FLOOR } else { divisor };

        let selling_price = cost.checked_div(divisor).unwrap_or(Decimal::MAX);

        Self {
            cost,
            markup_percent,
            selling_price,
            profit: selling_price.saturating_sub(cost),
            is_degenerate_markup,
        }
    }
}

/// Fully derived pricing projection of a quotation.
///
/// Field names mirror the stored document; keep them stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub breakdown: BTreeMap<CostCategory, CategoryPricing>,
    pub elements_cost: Decimal,
    pub trusses_cost: Decimal,
    pub windows_doors_cost: Decimal,
    pub worksite_deliveries_cost: Decimal,
    pub installation_cost: Decimal,
    pub transportation_cost: Decimal,
    pub design_cost: Decimal,
    pub material_cost_total: Decimal,
    pub selling_price_ex_vat: Decimal,
    pub profit_amount: Decimal,
    pub profit_percent: Decimal,
    pub commission_percentage: Decimal,
    pub commission_amount: Decimal,
    pub vat_percentage: Decimal,
    pub vat_amount: Decimal,
    pub total_with_vat: Decimal,
    pub has_degenerate_markup: bool,
}

impl Default for PricingResult {
    fn default() -> Self {
        let settings = PricingSettings::default();
        PricingResult::from_costs(&CategoryCosts::default(), &settings)
    }
}

impl PricingResult {
    pub fn category(&self, category: CostCategory) -> Option<&CategoryPricing> {
        self.breakdown.get(&category)
    }

    fn from_costs(costs: &CategoryCosts, settings: &PricingSettings) -> Self {
        let commission = settings.commission_percentage;

        let breakdown: BTreeMap<CostCategory, CategoryPricing> = CostCategory::ALL
            .iter()
            .map(|&category| {
                let pricing = CategoryPricing::derive(
                    costs.get(category),
                    settings.category_markups.get(category),
                    commission,
                );
                (category, pricing)
            })
            .collect();

        let material_cost_total = numeric::sum(breakdown.values().map(|c| c.cost));
        let selling_price_ex_vat = numeric::sum(breakdown.values().map(|c| c.selling_price));
        let commission_amount = numeric::sum(
            breakdown
                .values()
                .map(|c| percent_of(c.selling_price, commission)),
        );
        let profit_amount = selling_price_ex_vat.saturating_sub(material_cost_total);

        let denominator = if selling_price_ex_vat.is_zero() {
            Decimal::ONE
        } else {
            selling_price_ex_vat
        };
        let profit_percent = profit_amount
            .checked_div(denominator)
            .unwrap_or(Decimal::ZERO)
            .saturating_mul(Decimal::ONE_HUNDRED);

        let vat_percentage = settings.vat_mode.percentage();
        let vat_amount = percent_of(selling_price_ex_vat, vat_percentage);
        let total_with_vat = selling_price_ex_vat.saturating_add(vat_amount);
        let has_degenerate_markup = breakdown.values().any(|c| c.is_degenerate_markup);

        Self {
            breakdown,
            elements_cost: costs.elements,
            trusses_cost: costs.trusses,
            windows_doors_cost: costs.windows_doors,
            worksite_deliveries_cost: costs.worksite_deliveries,
            installation_cost: costs.installation,
            transportation_cost: costs.transportation,
            design_cost: costs.design,
            material_cost_total,
            selling_price_ex_vat,
            profit_amount,
            profit_percent,
            commission_percentage: commission,
            commission_amount,
            vat_percentage,
            vat_amount,
            total_with_vat,
            has_degenerate_markup,
        }
    }
}

/// Raw cost per category, each already clamped at zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCosts {
    pub elements: Decimal,
    pub trusses: Decimal,
    pub windows_doors: Decimal,
    pub worksite_deliveries: Decimal,
    pub installation: Decimal,
    pub transportation: Decimal,
    pub design: Decimal,
}

impl CategoryCosts {
    pub fn collect(quotation: &Quotation) -> Self {
        let element_items = quotation
            .element_sections
            .iter()
            .flat_map(|section| section.items.iter());

        let (mut elements, mut trusses) = (Decimal::ZERO, Decimal::ZERO);
        for item in element_items {
            let amount = non_negative(item.total_price);
            if item.is_truss() {
                trusses = trusses.saturating_add(amount);
            } else {
                elements = elements.saturating_add(amount);
            }
        }

        let (mut windows_doors, mut worksite_deliveries) = (Decimal::ZERO, Decimal::ZERO);
        for section in &quotation.product_sections {
            let section_total =
                numeric::sum(section.items.iter().map(|item| non_negative(item.total_price)));
            if section.is_windows_or_doors() {
                windows_doors = windows_doors.saturating_add(section_total);
            } else {
                worksite_deliveries = worksite_deliveries.saturating_add(section_total);
            }
        }

        let design = numeric::sum(
            quotation
                .documents
                .iter()
                .filter(|doc| doc.included)
                .map(|doc| non_negative(doc.price)),
        );

        let material_base = numeric::sum([elements, trusses, windows_doors, worksite_deliveries]);
        let level = assembly::resolve(quotation.delivery.assembly_level_id.as_deref());
        let custom_installation = numeric::sum(
            quotation
                .installation_items
                .iter()
                .map(|item| non_negative(item.amount)),
        );
        let installation = installation_estimate(material_base, level.pricing.base_multiplier)
            .saturating_add(custom_installation);

        let transportation = quotation.delivery.transportation.cost();

        Self {
            elements,
            trusses,
            windows_doors,
            worksite_deliveries,
            installation,
            transportation,
            design,
        }
    }

    pub fn get(&self, category: CostCategory) -> Decimal {
        match category {
            CostCategory::Elements => self.elements,
            CostCategory::Trusses => self.trusses,
            CostCategory::WindowsDoors => self.windows_doors,
            CostCategory::WorksiteDeliveries => self.worksite_deliveries,
            CostCategory::Installation => self.installation,
            CostCategory::Transportation => self.transportation,
            CostCategory::Design => self.design,
        }
    }
}

/// Installation share of a total that is `multiplier` times material cost.
pub fn installation_estimate(material_base: Decimal, base_multiplier: Decimal) -> Decimal {
    let material_base = non_negative(material_base);
    non_negative(
        material_base
            .saturating_mul(base_multiplier)
            .saturating_sub(material_base),
    )
}

/// Derive the full pricing projection of a quotation.
pub fn compute_pricing(quotation: &Quotation) -> PricingResult {
    let costs = CategoryCosts::collect(quotation);
    PricingResult::from_costs(&costs, &quotation.pricing_settings)
}
