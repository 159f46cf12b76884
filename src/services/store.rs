//! In-memory quotation store.
//!
//! Holds every open quotation behind a single lock and exposes a command
//! API. Each command runs against a working copy; on success the pricing
//! projection is recomputed from scratch, the revision is bumped and a
//! change event is published. A failed command leaves the stored quotation
//! untouched.
//!
//! Single editor per quotation: concurrent commands are serialized by the
//! lock and the last write wins. `revision` is the hook for optimistic
//! locking should collaborative editing be added.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{CreateQuotationRequest, Quotation, QuotationError, QuotationResult, QuotationSummary};

/// Change notification published after every successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotationEvent {
    Updated { id: Uuid, revision: u64 },
    Deleted { id: Uuid },
}

#[derive(Clone)]
pub struct QuotationStore {
    quotations: Arc<RwLock<HashMap<Uuid, Quotation>>>,
    events: broadcast::Sender<QuotationEvent>,
}

impl QuotationStore {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            quotations: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Receive change events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<QuotationEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: QuotationEvent) {
        // No subscribers is fine; autosave may be disabled.
        let _ = self.events.send(event);
    }

    #[instrument(skip(self, req), fields(title = %req.title))]
    pub fn create(&self, req: CreateQuotationRequest) -> Quotation {
        let quotation = Quotation::new(req);
        let id = quotation.id;
        self.quotations.write().insert(id, quotation.clone());

        info!(quotation_id = %id, "Quotation created");
        self.publish(QuotationEvent::Updated {
            id,
            revision: quotation.revision,
        });
        quotation
    }

    /// Insert a quotation loaded from elsewhere, recomputing its pricing.
    pub fn restore(&self, mut quotation: Quotation) -> Quotation {
        quotation.refresh_pricing();
        self.quotations
            .write()
            .insert(quotation.id, quotation.clone());
        debug!(quotation_id = %quotation.id, revision = quotation.revision, "Quotation restored");
        quotation
    }

    pub fn get(&self, id: Uuid) -> QuotationResult<Quotation> {
        self.quotations
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| QuotationError::NotFound("Quotation".into()))
    }

    /// Summaries ordered by most recently updated, plus the total count.
    pub fn list(&self, offset: usize, limit: usize) -> (Vec<QuotationSummary>, usize) {
        let quotations = self.quotations.read();
        let mut summaries: Vec<QuotationSummary> =
            quotations.values().map(QuotationSummary::from).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

        let total = summaries.len();
        let page = summaries.into_iter().skip(offset).take(limit).collect();
        (page, total)
    }

    /// Number of open quotations.
    pub fn count(&self) -> usize {
        self.quotations.read().len()
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> QuotationResult<()> {
        self.quotations
            .write()
            .remove(&id)
            .ok_or_else(|| QuotationError::NotFound("Quotation".into()))?;

        info!(quotation_id = %id, "Quotation deleted");
        self.publish(QuotationEvent::Deleted { id });
        Ok(())
    }

    /// Run a command against a quotation and recompute its pricing.
    ///
    /// Returns the command output together with the updated quotation.
    pub fn update<R, F>(&self, id: Uuid, command: F) -> QuotationResult<(R, Quotation)>
    where
        F: FnOnce(&mut Quotation) -> QuotationResult<R>,
    {
        let (output, updated) = {
            let mut quotations = self.quotations.write();
            let stored = quotations
                .get_mut(&id)
                .ok_or_else(|| QuotationError::NotFound("Quotation".into()))?;

            let mut working = stored.clone();
            let output = command(&mut working)?;

            let was_degenerate = stored.pricing.has_degenerate_markup;
            working.refresh_pricing();
            working.revision = stored.revision + 1;
            working.updated_at = Utc::now();

            if working.pricing.has_degenerate_markup && !was_degenerate {
                warn!(
                    quotation_id = %id,
                    "Markup plus commission reached 100%; selling price uses the divisor floor"
                );
            }

            *stored = working.clone();
            (output, working)
        };

        debug!(
            quotation_id = %id,
            revision = updated.revision,
            total_with_vat = %updated.pricing.total_with_vat,
            "Quotation updated"
        );
        self.publish(QuotationEvent::Updated {
            id,
            revision: updated.revision,
        });
        Ok((output, updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BuildingType, CreateElementItemRequest, Customer};
    use rust_decimal::Decimal;

    fn request() -> CreateQuotationRequest {
        CreateQuotationRequest {
            title: "Vapaa-ajan asunto".to_string(),
            customer: Customer::default(),
            site_address: None,
            building_type: BuildingType::HolidayHome,
            notes: None,
        }
    }

    fn wall(price: i64) -> CreateElementItemRequest {
        CreateElementItemRequest {
            element_type: "Ulkoseinä".to_string(),
            description: None,
            category: None,
            quantity: Decimal::ONE,
            unit: None,
            unit_price: Decimal::from(price),
            total_price: None,
        }
    }

    #[test]
    fn every_command_recomputes_pricing_and_bumps_revision() {
        let store = QuotationStore::new(16);
        let created = store.create(request());

        let (section, _) = store
            .update(created.id, |q| q.add_element_section("Seinät".to_string()))
            .unwrap();
        let (_, updated) = store
            .update(created.id, |q| q.add_element_item(section.id, wall(10_000)))
            .unwrap();

        assert_eq!(updated.revision, 2);
        assert_eq!(updated.pricing.elements_cost, Decimal::from(10_000));
        assert!(updated.pricing.total_with_vat > Decimal::ZERO);
        assert_eq!(store.get(created.id).unwrap(), updated);
    }

    #[test]
    fn failed_command_leaves_quotation_untouched() {
        let store = QuotationStore::new(16);
        let created = store.create(request());

        let result = store.update(created.id, |q| {
            q.title = "half-applied".to_string();
            q.remove_document(Uuid::new_v4())
        });

        assert!(matches!(result, Err(QuotationError::NotFound(_))));
        assert_eq!(store.get(created.id).unwrap(), created);
    }

    #[test]
    fn events_follow_commands() {
        let store = QuotationStore::new(16);
        let mut events = store.subscribe();
        let created = store.create(request());
        store
            .update(created.id, |q| q.add_element_section("A".to_string()))
            .unwrap();
        store.delete(created.id).unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            QuotationEvent::Updated { id: created.id, revision: 0 }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            QuotationEvent::Updated { id: created.id, revision: 1 }
        );
        assert_eq!(events.try_recv().unwrap(), QuotationEvent::Deleted { id: created.id });
    }

    #[test]
    fn list_pages_most_recent_first() {
        let store = QuotationStore::new(16);
        let first = store.create(request());
        let second = store.create(request());
        store
            .update(first.id, |q| q.add_element_section("A".to_string()))
            .unwrap();

        let (page, total) = store.list(0, 1);
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, first.id);

        let (rest, _) = store.list(1, 10);
        assert_eq!(rest[0].id, second.id);
    }

    #[test]
    fn missing_quotation_is_not_found() {
        let store = QuotationStore::new(16);
        assert!(matches!(
            store.update(Uuid::new_v4(), |_| Ok(())),
            Err(QuotationError::NotFound(_))
        ));
        assert!(store.delete(Uuid::new_v4()).is_err());
    }
}
