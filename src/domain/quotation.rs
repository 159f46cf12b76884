//! Quotation aggregate
//!
//! A quotation is created once per project as a draft, edited through the
//! command methods below and snapshotted into immutable versions. The
//! `pricing` field is a derived projection; callers refresh it after every
//! mutation (see `services::store`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use super::assembly;
use super::line_items::*;
use super::numeric::{self, non_negative};
use super::payments::{
    self, BuildingType, CreateMilestoneRequest, PaymentMilestone, UpdateMilestoneRequest,
};
use super::pricing::{compute_pricing, CostCategory, PricingResult, PricingSettings, VatMode};

pub const DEFAULT_TRUCK_COUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 0);

pub const DEFAULT_RATE_PER_KM: Decimal = Decimal::from_parts(220, 0, 0, false, 2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotationError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),
}

pub type QuotationResult<T> = Result<T, QuotationError>;

/// Quotation lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    #[default]
    Draft,
    AwaitingApproval,
    Approved,
    Sent,
    Accepted,
    Rejected,
}

impl QuotationStatus {
    pub fn can_transition_to(self, next: QuotationStatus) -> bool {
        use QuotationStatus::*;
        matches!(
            (self, next),
            (Draft, AwaitingApproval)
                | (AwaitingApproval, Approved)
                | (AwaitingApproval, Draft)
                | (Approved, Sent)
                | (Sent, Accepted)
                | (Sent, Rejected)
        )
    }

    /// Accepted and rejected quotations no longer change.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Delivery logistics. Unset values take their defaults when read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Transportation {
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub distance_km: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub truck_count: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub rate_per_km: Option<Decimal>,
}

impl Transportation {
    pub fn distance_km(&self) -> Decimal {
        non_negative(self.distance_km.unwrap_or(Decimal::ZERO))
    }

    pub fn truck_count(&self) -> Decimal {
        non_negative(self.truck_count.unwrap_or(DEFAULT_TRUCK_COUNT))
    }

    pub fn rate_per_km(&self) -> Decimal {
        non_negative(self.rate_per_km.unwrap_or(DEFAULT_RATE_PER_KM))
    }

    /// Round trip: `(distance * 2) * rate * trucks`.
    pub fn cost(&self) -> Decimal {
        self.distance_km()
            .saturating_mul(Decimal::TWO)
            .saturating_mul(self.rate_per_km())
            .saturating_mul(self.truck_count())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySettings {
    #[serde(default)]
    pub assembly_level_id: Option<String>,
    #[serde(default)]
    pub transportation: Transportation,
}

/// Immutable snapshot of a quotation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotationVersion {
    pub number: u32,
    pub is_active: bool,
    pub is_sent: bool,
    pub created_at: DateTime<Utc>,
    pub snapshot: Quotation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    /// Bumped on every mutation.
    #[serde(default)]
    pub revision: u64,
    pub title: String,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub building_type: BuildingType,
    #[serde(default)]
    pub status: QuotationStatus,
    #[serde(default)]
    pub element_sections: Vec<ElementSection>,
    #[serde(default = "ProductSection::fixed")]
    pub product_sections: Vec<ProductSection>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub pricing_settings: PricingSettings,
    #[serde(default)]
    pub delivery: DeliverySettings,
    #[serde(default)]
    pub installation_items: Vec<InstallationItem>,
    #[serde(default)]
    pub payment_schedule: Vec<PaymentMilestone>,
    #[serde(default)]
    pub pricing: PricingResult,
    #[serde(default)]
    pub versions: Vec<QuotationVersion>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a quotation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationRequest {
    pub title: String,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub building_type: BuildingType,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for updating the quotation header
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuotationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub site_address: Option<String>,
    #[serde(default)]
    pub building_type: Option<BuildingType>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for pricing settings. A `null` markup resets the category to
/// its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePricingSettingsRequest {
    #[serde(default)]
    pub category_markups: BTreeMap<CostCategory, Value>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub commission_percentage: Option<Decimal>,
    #[serde(default)]
    pub vat_mode: Option<VatMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransportationRequest {
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub distance_km: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub truck_count: Option<Decimal>,
    #[serde(default, deserialize_with = "numeric::optional_decimal")]
    pub rate_per_km: Option<Decimal>,
}

/// Request DTO for delivery settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliveryRequest {
    #[serde(default)]
    pub assembly_level_id: Option<String>,
    #[serde(default)]
    pub transportation: Option<UpdateTransportationRequest>,
}

/// Request DTO for a lifecycle transition
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub status: QuotationStatus,
}

/// List row for quotations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationSummary {
    pub id: Uuid,
    pub title: String,
    pub customer_name: String,
    pub status: QuotationStatus,
    pub revision: u64,
    pub total_with_vat: Decimal,
    pub version_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Quotation> for QuotationSummary {
    fn from(q: &Quotation) -> Self {
        Self {
            id: q.id,
            title: q.title.clone(),
            customer_name: q.customer.name.clone(),
            status: q.status,
            revision: q.revision,
            total_with_vat: q.pricing.total_with_vat,
            version_count: q.versions.len(),
            updated_at: q.updated_at,
        }
    }
}

impl Quotation {
    pub fn new(req: CreateQuotationRequest) -> Self {
        let now = Utc::now();
        let mut quotation = Self {
            id: Uuid::new_v4(),
            revision: 0,
            title: req.title,
            customer: req.customer,
            site_address: req.site_address,
            building_type: req.building_type,
            status: QuotationStatus::Draft,
            element_sections: Vec::new(),
            product_sections: ProductSection::fixed(),
            documents: Document::standard_catalog(),
            pricing_settings: PricingSettings::default(),
            delivery: DeliverySettings {
                assembly_level_id: Some(assembly::DEFAULT_ASSEMBLY_LEVEL_ID.to_string()),
                transportation: Transportation::default(),
            },
            installation_items: Vec::new(),
            payment_schedule: Vec::new(),
            pricing: PricingResult::default(),
            versions: Vec::new(),
            notes: req.notes,
            created_at: now,
            updated_at: now,
        };
        quotation.refresh_pricing();
        quotation
    }

    /// Recompute the derived pricing projection from scratch.
    pub fn refresh_pricing(&mut self) {
        self.pricing = compute_pricing(self);
    }

    fn ensure_editable(&self) -> QuotationResult<()> {
        if self.status.is_closed() {
            return Err(QuotationError::Conflict(format!(
                "Quotation is {:?} and can no longer be edited",
                self.status
            )));
        }
        Ok(())
    }

    pub fn update_header(&mut self, req: UpdateQuotationRequest) -> QuotationResult<()> {
        self.ensure_editable()?;
        if let Some(title) = req.title {
            if title.trim().is_empty() {
                return Err(QuotationError::Validation("Title cannot be empty".into()));
            }
            self.title = title;
        }
        if let Some(customer) = req.customer {
            self.customer = customer;
        }
        if let Some(site_address) = req.site_address {
            self.site_address = Some(site_address);
        }
        if let Some(building_type) = req.building_type {
            self.building_type = building_type;
        }
        if let Some(notes) = req.notes {
            self.notes = Some(notes);
        }
        Ok(())
    }

    // ---- pricing inputs ----

    pub fn update_pricing_settings(
        &mut self,
        req: UpdatePricingSettingsRequest,
    ) -> QuotationResult<()> {
        self.ensure_editable()?;
        for (category, raw) in &req.category_markups {
            let percent = numeric::coerce(raw).unwrap_or_else(|| category.default_markup());
            self.pricing_settings.category_markups.set(*category, percent);
        }
        if let Some(commission) = req.commission_percentage {
            self.pricing_settings.commission_percentage = commission;
        }
        if let Some(vat_mode) = req.vat_mode {
            self.pricing_settings.vat_mode = vat_mode;
        }
        Ok(())
    }

    pub fn update_delivery(&mut self, req: UpdateDeliveryRequest) -> QuotationResult<()> {
        self.ensure_editable()?;
        if let Some(level_id) = req.assembly_level_id {
            if assembly::find(&level_id).is_none() {
                return Err(QuotationError::Validation(format!(
                    "Unknown assembly level '{}'",
                    level_id
                )));
            }
            self.delivery.assembly_level_id = Some(level_id);
        }
        if let Some(patch) = req.transportation {
            let transportation = &mut self.delivery.transportation;
            if patch.distance_km.is_some() {
                transportation.distance_km = patch.distance_km;
            }
            if patch.truck_count.is_some() {
                transportation.truck_count = patch.truck_count;
            }
            if patch.rate_per_km.is_some() {
                transportation.rate_per_km = patch.rate_per_km;
            }
        }
        Ok(())
    }

    // ---- element sections ----

    pub fn add_element_section(&mut self, name: String) -> QuotationResult<ElementSection> {
        self.ensure_editable()?;
        let section = ElementSection {
            id: Uuid::new_v4(),
            name,
            items: Vec::new(),
        };
        self.element_sections.push(section.clone());
        Ok(section)
    }

    pub fn remove_element_section(&mut self, section_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let before = self.element_sections.len();
        self.element_sections.retain(|s| s.id != section_id);
        if self.element_sections.len() == before {
            return Err(QuotationError::NotFound("Element section".into()));
        }
        Ok(())
    }

    fn element_section_mut(&mut self, section_id: Uuid) -> QuotationResult<&mut ElementSection> {
        self.element_sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| QuotationError::NotFound("Element section".into()))
    }

    pub fn add_element_item(
        &mut self,
        section_id: Uuid,
        req: CreateElementItemRequest,
    ) -> QuotationResult<ElementItem> {
        self.ensure_editable()?;
        let item = ElementItem::from(req);
        self.element_section_mut(section_id)?.items.push(item.clone());
        Ok(item)
    }

    pub fn update_element_item(
        &mut self,
        section_id: Uuid,
        item_id: Uuid,
        req: UpdateElementItemRequest,
    ) -> QuotationResult<ElementItem> {
        self.ensure_editable()?;
        let item = self
            .element_section_mut(section_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| QuotationError::NotFound("Element item".into()))?;
        item.apply(req);
        Ok(item.clone())
    }

    pub fn remove_element_item(&mut self, section_id: Uuid, item_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let items = &mut self.element_section_mut(section_id)?.items;
        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(QuotationError::NotFound("Element item".into()));
        }
        Ok(())
    }

    // ---- product sections ----

    pub fn add_product_section(&mut self, name: String) -> QuotationResult<ProductSection> {
        self.ensure_editable()?;
        let section = ProductSection {
            id: Uuid::new_v4().to_string(),
            name,
            items: Vec::new(),
        };
        self.product_sections.push(section.clone());
        Ok(section)
    }

    pub fn remove_product_section(&mut self, section_id: &str) -> QuotationResult<()> {
        self.ensure_editable()?;
        if section_id == WINDOWS_SECTION_ID || section_id == DOORS_SECTION_ID {
            return Err(QuotationError::Validation(format!(
                "Section '{}' is fixed and cannot be removed",
                section_id
            )));
        }
        let before = self.product_sections.len();
        self.product_sections.retain(|s| s.id != section_id);
        if self.product_sections.len() == before {
            return Err(QuotationError::NotFound("Product section".into()));
        }
        Ok(())
    }

    fn product_section_mut(&mut self, section_id: &str) -> QuotationResult<&mut ProductSection> {
        self.product_sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| QuotationError::NotFound("Product section".into()))
    }

    pub fn add_product_item(
        &mut self,
        section_id: &str,
        req: CreateProductItemRequest,
    ) -> QuotationResult<ProductItem> {
        self.ensure_editable()?;
        let item = ProductItem::from(req);
        self.product_section_mut(section_id)?.items.push(item.clone());
        Ok(item)
    }

    pub fn update_product_item(
        &mut self,
        section_id: &str,
        item_id: Uuid,
        req: UpdateProductItemRequest,
    ) -> QuotationResult<ProductItem> {
        self.ensure_editable()?;
        let item = self
            .product_section_mut(section_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| QuotationError::NotFound("Product item".into()))?;
        item.apply(req);
        Ok(item.clone())
    }

    pub fn remove_product_item(&mut self, section_id: &str, item_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let items = &mut self.product_section_mut(section_id)?.items;
        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(QuotationError::NotFound("Product item".into()));
        }
        Ok(())
    }

    // ---- documents ----

    pub fn add_document(&mut self, req: CreateDocumentRequest) -> QuotationResult<Document> {
        self.ensure_editable()?;
        let document = Document::from(req);
        self.documents.push(document.clone());
        Ok(document)
    }

    pub fn update_document(
        &mut self,
        document_id: Uuid,
        req: UpdateDocumentRequest,
    ) -> QuotationResult<Document> {
        self.ensure_editable()?;
        let document = self
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or_else(|| QuotationError::NotFound("Document".into()))?;
        document.apply(req);
        Ok(document.clone())
    }

    pub fn remove_document(&mut self, document_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let before = self.documents.len();
        self.documents.retain(|d| d.id != document_id);
        if self.documents.len() == before {
            return Err(QuotationError::NotFound("Document".into()));
        }
        Ok(())
    }

    // ---- custom installation ----

    pub fn add_installation_item(
        &mut self,
        req: CreateInstallationItemRequest,
    ) -> QuotationResult<InstallationItem> {
        self.ensure_editable()?;
        let item = InstallationItem::from(req);
        self.installation_items.push(item.clone());
        Ok(item)
    }

    pub fn remove_installation_item(&mut self, item_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let before = self.installation_items.len();
        self.installation_items.retain(|i| i.id != item_id);
        if self.installation_items.len() == before {
            return Err(QuotationError::NotFound("Installation item".into()));
        }
        Ok(())
    }

    // ---- payment schedule ----

    /// Replace the schedule with the template for `building_type`, priced
    /// against the current total.
    pub fn apply_payment_template(&mut self, building_type: BuildingType) -> QuotationResult<()> {
        self.ensure_editable()?;
        let total_with_vat = compute_pricing(self).total_with_vat;
        self.payment_schedule = payments::apply_template(building_type, total_with_vat);
        self.building_type = building_type;
        Ok(())
    }

    pub fn recompute_payment_amounts(&mut self) -> QuotationResult<()> {
        self.ensure_editable()?;
        let total_with_vat = compute_pricing(self).total_with_vat;
        payments::recompute_amounts(&mut self.payment_schedule, total_with_vat);
        Ok(())
    }

    pub fn add_milestone(&mut self, req: CreateMilestoneRequest) -> QuotationResult<PaymentMilestone> {
        self.ensure_editable()?;
        let order = req.order.unwrap_or_else(|| {
            self.payment_schedule
                .iter()
                .map(|m| m.order)
                .max()
                .unwrap_or(0)
                .saturating_add(1)
        });
        let milestone = PaymentMilestone {
            id: Uuid::new_v4(),
            order,
            description: req.description,
            trigger: req.trigger,
            percentage: req.percentage,
            amount: req.amount,
        };
        self.payment_schedule.push(milestone.clone());
        Ok(milestone)
    }

    pub fn update_milestone(
        &mut self,
        milestone_id: Uuid,
        req: UpdateMilestoneRequest,
    ) -> QuotationResult<PaymentMilestone> {
        self.ensure_editable()?;
        let milestone = self
            .payment_schedule
            .iter_mut()
            .find(|m| m.id == milestone_id)
            .ok_or_else(|| QuotationError::NotFound("Milestone".into()))?;
        milestone.apply(req);
        Ok(milestone.clone())
    }

    pub fn remove_milestone(&mut self, milestone_id: Uuid) -> QuotationResult<()> {
        self.ensure_editable()?;
        let before = self.payment_schedule.len();
        self.payment_schedule.retain(|m| m.id != milestone_id);
        if self.payment_schedule.len() == before {
            return Err(QuotationError::NotFound("Milestone".into()));
        }
        Ok(())
    }

    // ---- lifecycle and versions ----

    pub fn transition(&mut self, next: QuotationStatus) -> QuotationResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(QuotationError::Conflict(format!(
                "Cannot move quotation from {:?} to {:?}",
                self.status, next
            )));
        }

        if next == QuotationStatus::Sent {
            let current = self
                .active_version()
                .map(|v| v.snapshot.same_content(self))
                .unwrap_or(false);
            if !current {
                self.create_version();
            }
            if let Some(version) = self.versions.iter_mut().find(|v| v.is_active) {
                version.is_sent = true;
            }
        }

        self.status = next;
        Ok(())
    }

    /// Equal customer-facing content, ignoring status and bookkeeping.
    pub fn same_content(&self, other: &Quotation) -> bool {
        self.title == other.title
            && self.customer == other.customer
            && self.site_address == other.site_address
            && self.building_type == other.building_type
            && self.element_sections == other.element_sections
            && self.product_sections == other.product_sections
            && self.documents == other.documents
            && self.pricing_settings == other.pricing_settings
            && self.delivery == other.delivery
            && self.installation_items == other.installation_items
            && self.payment_schedule == other.payment_schedule
            && self.notes == other.notes
    }

    pub fn active_version(&self) -> Option<&QuotationVersion> {
        self.versions.iter().find(|v| v.is_active)
    }

    /// Snapshot the current state as the next numbered, active version.
    pub fn create_version(&mut self) -> &QuotationVersion {
        let versions = std::mem::take(&mut self.versions);
        let snapshot = self.clone();
        self.versions = versions;

        for version in &mut self.versions {
            version.is_active = false;
        }
        let number = self.versions.len() as u32 + 1;
        self.versions.push(QuotationVersion {
            number,
            is_active: true,
            is_sent: false,
            created_at: Utc::now(),
            snapshot,
        });
        &self.versions[self.versions.len() - 1]
    }

    pub fn version(&self, number: u32) -> Option<&QuotationVersion> {
        self.versions.iter().find(|v| v.number == number)
    }
}
