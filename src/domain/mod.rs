//! Domain types and the pricing engine
//!
//! The quotation aggregate, its line items, the assembly level catalog,
//! payment schedule derivation and the pricing engine itself.

pub mod assembly;
pub mod line_items;
pub mod numeric;
pub mod payments;
pub mod pricing;
pub mod quotation;

// Re-export commonly used types
pub use line_items::*;
pub use payments::{BuildingType, PaymentMilestone, PaymentScheduleSummary};
pub use pricing::{compute_pricing, CategoryPricing, CostCategory, PricingResult, PricingSettings, VatMode};
pub use quotation::*;
