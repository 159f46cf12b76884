//! Assembly level catalog
//!
//! Static installation-scope bundles. The selected level drives the
//! installation cost estimate through its base multiplier.

use rust_decimal::Decimal;
use serde::Serialize;

/// Id of the level used when a quotation has none selected.
pub const DEFAULT_ASSEMBLY_LEVEL_ID: &str = "shell";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyPricing {
    /// Total cost including installation as a multiple of material cost.
    pub base_multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyLevel {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub pricing: AssemblyPricing,
    pub included_items: &'static [&'static str],
    pub excluded_items: &'static [&'static str],
    pub estimated_duration_days: u32,
    pub crew_size: u32,
}

const fn level(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    multiplier_hundredths: u32,
    included_items: &'static [&'static str],
    excluded_items: &'static [&'static str],
    estimated_duration_days: u32,
    crew_size: u32,
) -> AssemblyLevel {
    AssemblyLevel {
        id,
        name,
        description,
        pricing: AssemblyPricing {
            base_multiplier: Decimal::from_parts(multiplier_hundredths, 0, 0, false, 2),
        },
        included_items,
        excluded_items,
        estimated_duration_days,
        crew_size,
    }
}

static CATALOG: [AssemblyLevel; 4] = [
    level(
        "material_delivery",
        "Material delivery",
        "Elements and materials delivered to site, customer arranges installation.",
        100,
        &["Factory-built elements", "Worksite deliveries", "Unloading instructions"],
        &["Element installation", "Roof installation", "Crane", "Interior work"],
        0,
        0,
    ),
    level(
        "shell",
        "Shell only",
        "Wall elements erected on the foundation and braced.",
        120,
        &["Wall element installation", "Crane and lifting", "Temporary bracing"],
        &["Roof trusses", "Roofing", "Windows and doors", "Interior work"],
        5,
        3,
    ),
    level(
        "weathertight",
        "Shell and roof",
        "Shell with trusses, roofing, windows and exterior doors installed.",
        135,
        &[
            "Wall element installation",
            "Roof truss installation",
            "Roofing",
            "Window and exterior door installation",
            "Crane and lifting",
        ],
        &["Interior finishing", "HVAC", "Electrical"],
        12,
        4,
    ),
    level(
        "turnkey",
        "Turnkey",
        "Move-in ready building including interior finishing.",
        160,
        &[
            "Wall element installation",
            "Roof truss installation",
            "Roofing",
            "Window and door installation",
            "Interior finishing",
            "Site supervision",
        ],
        &["Foundation", "Earthworks", "Utility connections"],
        60,
        5,
    ),
];

/// All assembly levels in presentation order.
pub fn catalog() -> &'static [AssemblyLevel] {
    &CATALOG
}

/// Look up a level by id.
pub fn find(id: &str) -> Option<&'static AssemblyLevel> {
    CATALOG.iter().find(|level| level.id == id)
}

/// Resolve the effective level, falling back to the default for unset or
/// unknown ids.
pub fn resolve(id: Option<&str>) -> &'static AssemblyLevel {
    id.and_then(find).unwrap_or_else(default_level)
}

pub fn default_level() -> &'static AssemblyLevel {
    CATALOG
        .iter()
        .find(|level| level.id == DEFAULT_ASSEMBLY_LEVEL_ID)
        .unwrap_or(&CATALOG[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_or_missing_id_falls_back_to_default() {
        assert_eq!(resolve(None).id, DEFAULT_ASSEMBLY_LEVEL_ID);
        assert_eq!(resolve(Some("no-such-level")).id, DEFAULT_ASSEMBLY_LEVEL_ID);
        assert_eq!(resolve(Some("turnkey")).id, "turnkey");
    }

    #[test]
    fn default_level_multiplier() {
        assert_eq!(
            default_level().pricing.base_multiplier,
            Decimal::new(12, 1)
        );
    }

    #[test]
    fn multipliers_never_below_one() {
        for level in catalog() {
            assert!(level.pricing.base_multiplier >= Decimal::ONE, "{}", level.id);
        }
    }
}
