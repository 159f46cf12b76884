//! Line item domain types
//!
//! Element sections (factory-built walls and roof trusses), product sections
//! (windows, doors and worksite deliveries), design documents and custom
//! installation scope.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numeric;

/// Keyword identifying roof trusses in free-text element types.
pub const TRUSS_KEYWORD: &str = "ristikko";

/// Fixed product section for windows.
pub const WINDOWS_SECTION_ID: &str = "windows";

/// Fixed product section for doors.
pub const DOORS_SECTION_ID: &str = "doors";

/// Explicit cost classification of an element line item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Element,
    Truss,
}

impl ElementCategory {
    /// Classify a free-text element type by the truss keyword.
    pub fn classify(element_type: &str) -> Self {
        if element_type.to_lowercase().contains(TRUSS_KEYWORD) {
            Self::Truss
        } else {
            Self::Element
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementItem {
    pub id: Uuid,
    #[serde(rename = "type", default)]
    pub element_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Documents stored before explicit tagging carry no category.
    #[serde(default)]
    pub category: Option<ElementCategory>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub total_price: Decimal,
}

impl ElementItem {
    pub fn category(&self) -> ElementCategory {
        self.category
            .unwrap_or_else(|| ElementCategory::classify(&self.element_type))
    }

    pub fn is_truss(&self) -> bool {
        self.category() == ElementCategory::Truss
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementSection {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ElementItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductSection {
    /// `windows`, `doors`, or a generated id for worksite sections.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ProductItem>,
}

impl ProductSection {
    pub fn is_windows_or_doors(&self) -> bool {
        self.id == WINDOWS_SECTION_ID || self.id == DOORS_SECTION_ID
    }

    pub(crate) fn fixed() -> Vec<ProductSection> {
        vec![
            ProductSection {
                id: WINDOWS_SECTION_ID.to_string(),
                name: "Windows".to_string(),
                items: Vec::new(),
            },
            ProductSection {
                id: DOORS_SECTION_ID.to_string(),
                name: "Doors".to_string(),
                items: Vec::new(),
            },
        ]
    }
}

/// Design document priced into the quotation when included.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub included: bool,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub price: Decimal,
}

impl Document {
    /// Standard design documents offered on every new quotation.
    pub(crate) fn standard_catalog() -> Vec<Document> {
        [
            ("Main drawings", 1800),
            ("Structural drawings", 1500),
            ("Element drawings", 900),
            ("Energy certificate", 450),
            ("Foundation drawings", 650),
        ]
        .into_iter()
        .map(|(name, price)| Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            included: false,
            price: Decimal::from(price),
        })
        .collect()
    }
}

/// Extra installation scope priced on top of the assembly level estimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstallationItem {
    pub id: Uuid,
    pub description: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub amount: Decimal,
}

fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity.saturating_mul(unit_price)
}

/// Request DTO for adding an element line item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElementItemRequest {
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Inferred from `type` when omitted.
    #[serde(default)]
    pub category: Option<ElementCategory>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub total_price: Option<Decimal>,
}

impl From<CreateElementItemRequest> for ElementItem {
    fn from(req: CreateElementItemRequest) -> Self {
        let category = req
            .category
            .unwrap_or_else(|| ElementCategory::classify(&req.element_type));
        let total_price = req
            .total_price
            .unwrap_or_else(|| line_total(req.quantity, req.unit_price));

        Self {
            id: Uuid::new_v4(),
            element_type: req.element_type,
            description: req.description,
            category: Some(category),
            quantity: req.quantity,
            unit: req.unit,
            unit_price: req.unit_price,
            total_price,
        }
    }
}

/// Request DTO for updating an element line item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElementItemRequest {
    #[serde(default, rename = "type")]
    pub element_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<ElementCategory>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub total_price: Option<Decimal>,
}

impl ElementItem {
    /// Apply a partial edit. The category tag is kept unless explicitly
    /// changed; quantity or unit price edits re-derive the total.
    pub fn apply(&mut self, req: UpdateElementItemRequest) {
        if let Some(element_type) = req.element_type {
            self.element_type = element_type;
        }
        if let Some(description) = req.description {
            self.description = Some(description);
        }
        if let Some(category) = req.category {
            self.category = Some(category);
        }
        if let Some(unit) = req.unit {
            self.unit = Some(unit);
        }

        let repriced = req.quantity.is_some() || req.unit_price.is_some();
        if let Some(quantity) = req.quantity {
            self.quantity = quantity;
        }
        if let Some(unit_price) = req.unit_price {
            self.unit_price = unit_price;
        }
        match req.total_price {
            Some(total) => self.total_price = total,
            None if repriced => self.total_price = line_total(self.quantity, self.unit_price),
            None => {}
        }
    }
}

/// Request DTO for adding a product line item
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductItemRequest {
    pub name: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub unit_price: Decimal,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub total_price: Option<Decimal>,
}

impl From<CreateProductItemRequest> for ProductItem {
    fn from(req: CreateProductItemRequest) -> Self {
        let total_price = req
            .total_price
            .unwrap_or_else(|| line_total(req.quantity, req.unit_price));

        Self {
            id: Uuid::new_v4(),
            name: req.name,
            quantity: req.quantity,
            unit: req.unit,
            unit_price: req.unit_price,
            total_price,
        }
    }
}

/// Request DTO for updating a product line item
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub total_price: Option<Decimal>,
}

impl ProductItem {
    pub fn apply(&mut self, req: UpdateProductItemRequest) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(unit) = req.unit {
            self.unit = Some(unit);
        }

        let repriced = req.quantity.is_some() || req.unit_price.is_some();
        if let Some(quantity) = req.quantity {
            self.quantity = quantity;
        }
        if let Some(unit_price) = req.unit_price {
            self.unit_price = unit_price;
        }
        match req.total_price {
            Some(total) => self.total_price = total,
            None if repriced => self.total_price = line_total(self.quantity, self.unit_price),
            None => {}
        }
    }
}

/// Request DTO for adding a section (element or product)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSectionRequest {
    pub name: String,
}

/// Request DTO for adding a document
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub name: String,
    #[serde(default)]
    pub included: bool,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub price: Decimal,
}

impl From<CreateDocumentRequest> for Document {
    fn from(req: CreateDocumentRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: req.name,
            included: req.included,
            price: req.price,
        }
    }
}

/// Request DTO for updating a document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub included: Option<bool>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub price: Option<Decimal>,
}

impl Document {
    pub fn apply(&mut self, req: UpdateDocumentRequest) {
        if let Some(name) = req.name {
            self.name = name;
        }
        if let Some(included) = req.included {
            self.included = included;
        }
        if let Some(price) = req.price {
            self.price = price;
        }
    }
}

/// Request DTO for adding a custom installation item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstallationItemRequest {
    pub description: String,
    #[serde(default, deserialize_with = "numeric::decimal")]
    pub amount: Decimal,
}

impl From<CreateInstallationItemRequest> for InstallationItem {
    fn from(req: CreateInstallationItemRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: req.description,
            amount: req.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truss_keyword_is_case_insensitive() {
        assert_eq!(ElementCategory::classify("Kattoristikko KR-1"), ElementCategory::Truss);
        assert_eq!(ElementCategory::classify("RISTIKKO"), ElementCategory::Truss);
        assert_eq!(ElementCategory::classify("Ulkoseinä US-1"), ElementCategory::Element);
    }

    #[test]
    fn new_items_are_tagged_at_creation() {
        let req: CreateElementItemRequest = serde_json::from_value(json!({
            "type": "Kattoristikko",
            "quantity": 12,
            "unitPrice": "150,50"
        }))
        .unwrap();
        let item = ElementItem::from(req);

        assert_eq!(item.category, Some(ElementCategory::Truss));
        assert_eq!(item.total_price, Decimal::new(1806, 0));
    }

    #[test]
    fn explicit_tag_wins_over_wording() {
        let mut item = ElementItem::from(CreateElementItemRequest {
            element_type: "Kattoristikko".to_string(),
            description: None,
            category: Some(ElementCategory::Element),
            quantity: Decimal::ONE,
            unit: None,
            unit_price: Decimal::from(100),
            total_price: None,
        });
        assert!(!item.is_truss());

        // Renaming the type does not reclassify a tagged item.
        item.apply(UpdateElementItemRequest {
            element_type: Some("Ristikko R2".to_string()),
            ..Default::default()
        });
        assert!(!item.is_truss());
    }

    #[test]
    fn untagged_legacy_items_use_keyword() {
        let item: ElementItem = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "type": "Ristikko 12m",
            "totalPrice": 2500
        }))
        .unwrap();
        assert_eq!(item.category, None);
        assert!(item.is_truss());
    }

    #[test]
    fn repricing_rederives_total_unless_given() {
        let mut item = ProductItem::from(CreateProductItemRequest {
            name: "Ikkuna 12x14".to_string(),
            quantity: Decimal::from(4),
            unit: Some("kpl".to_string()),
            unit_price: Decimal::from(350),
            total_price: None,
        });
        assert_eq!(item.total_price, Decimal::from(1400));

        item.apply(UpdateProductItemRequest {
            quantity: Some(Decimal::from(5)),
            ..Default::default()
        });
        assert_eq!(item.total_price, Decimal::from(1750));

        item.apply(UpdateProductItemRequest {
            total_price: Some(Decimal::from(1600)),
            ..Default::default()
        });
        assert_eq!(item.total_price, Decimal::from(1600));
    }

    #[test]
    fn non_numeric_price_reads_as_zero() {
        let item: ProductItem = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": "Puutavara",
            "totalPrice": "n/a"
        }))
        .unwrap();
        assert_eq!(item.total_price, Decimal::ZERO);
    }
}
