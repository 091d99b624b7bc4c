//! In-process offer store.
//!
//! Enforces the same constraints as the Postgres schema and gives the same
//! all-or-nothing transaction semantics. A transaction holds the whole store
//! exclusively from `begin` until commit or drop, which also makes
//! `lock_identifier` a no-op. Used by tests and by dry-run imports.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mobsync_core::{CanonicalId, UpstreamCavalete, UpstreamItem, UpstreamOffer};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::offers::{CavaleteRow, ItemRow, OfferRow, OfferTree};
use crate::store::{item_count, principal_image_json, ChildCounts, OfferStore, OfferTransaction};
use crate::DbError;

#[derive(Debug, Clone, Default)]
struct State {
    offers: Vec<OfferRow>,
    cavaletes: Vec<CavaleteRow>,
    items: Vec<ItemRow>,
    /// Item code whose insert is refused, for exercising rollback.
    fail_item_code: Option<String>,
}

impl State {
    fn find_offer_id(&self, canonical_id: &CanonicalId) -> Option<Uuid> {
        self.offers
            .iter()
            .find(|o| o.canonical_id == canonical_id.as_str())
            .map(|o| o.id)
    }

    fn count_children(&self, offer_id: Uuid) -> ChildCounts {
        let cavalete_ids: Vec<Uuid> = self
            .cavaletes
            .iter()
            .filter(|c| c.offer_id == offer_id)
            .map(|c| c.id)
            .collect();
        let items = self
            .items
            .iter()
            .filter(|i| cavalete_ids.contains(&i.cavalete_id))
            .count();
        ChildCounts {
            cavaletes: i64::try_from(cavalete_ids.len()).unwrap_or(i64::MAX),
            items: i64::try_from(items).unwrap_or(i64::MAX),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryOfferStore {
    state: Arc<Mutex<State>>,
}

impl MemoryOfferStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later insert of an item with this `code` fail with
    /// [`DbError::Constraint`].
    pub async fn fail_on_item_code(&self, code: impl Into<String>) {
        self.state.lock().await.fail_item_code = Some(code.into());
    }

    pub async fn offer_count(&self) -> usize {
        self.state.lock().await.offers.len()
    }

    /// Loads one offer with its cavaletes and items, in insertion order.
    pub async fn get_offer_tree(&self, offer_id: Uuid) -> Option<OfferTree> {
        let state = self.state.lock().await;
        let offer = state.offers.iter().find(|o| o.id == offer_id)?.clone();
        let cavaletes: Vec<CavaleteRow> = state
            .cavaletes
            .iter()
            .filter(|c| c.offer_id == offer_id)
            .cloned()
            .collect();
        let items: Vec<ItemRow> = state
            .items
            .iter()
            .filter(|i| cavaletes.iter().any(|c| c.id == i.cavalete_id))
            .cloned()
            .collect();
        Some(OfferTree::assemble(offer, cavaletes, items))
    }
}

#[async_trait]
impl OfferStore for MemoryOfferStore {
    async fn find_offer_id(&self, canonical_id: &CanonicalId) -> Result<Option<Uuid>, DbError> {
        Ok(self.state.lock().await.find_offer_id(canonical_id))
    }

    async fn count_children(&self, offer_id: Uuid) -> Result<ChildCounts, DbError> {
        Ok(self.state.lock().await.count_children(offer_id))
    }

    async fn begin(&self) -> Result<Box<dyn OfferTransaction>, DbError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(MemoryOfferTransaction {
            guard,
            snapshot: Some(snapshot),
        }))
    }
}

/// Writes go straight into the guarded state; `snapshot` is restored on drop
/// unless the transaction committed.
pub struct MemoryOfferTransaction {
    guard: OwnedMutexGuard<State>,
    snapshot: Option<State>,
}

impl Drop for MemoryOfferTransaction {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            *self.guard = snapshot;
        }
    }
}

#[async_trait]
impl OfferTransaction for MemoryOfferTransaction {
    async fn lock_identifier(&mut self, _canonical_id: &CanonicalId) -> Result<(), DbError> {
        Ok(())
    }

    async fn find_offer_id(
        &mut self,
        canonical_id: &CanonicalId,
    ) -> Result<Option<Uuid>, DbError> {
        Ok(self.guard.find_offer_id(canonical_id))
    }

    async fn insert_offer(
        &mut self,
        canonical_id: &CanonicalId,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<Uuid, DbError> {
        if self.guard.find_offer_id(canonical_id).is_some() {
            return Err(DbError::Constraint("offers_canonical_id_key".into()));
        }
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.guard.offers.push(OfferRow {
            id,
            canonical_id: canonical_id.as_str().to_owned(),
            status: offer.situacao.clone(),
            company_name: offer.nome_empresa.clone(),
            logo_url: offer.url_logo.clone(),
            raw_document: raw_document.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update_offer(
        &mut self,
        offer_id: Uuid,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<(), DbError> {
        let row = self
            .guard
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or(DbError::NotFound)?;
        row.status.clone_from(&offer.situacao);
        row.company_name.clone_from(&offer.nome_empresa);
        row.logo_url.clone_from(&offer.url_logo);
        row.raw_document = raw_document.clone();
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_children(&mut self, offer_id: Uuid) -> Result<u64, DbError> {
        let state = &mut *self.guard;
        let doomed: Vec<Uuid> = state
            .cavaletes
            .iter()
            .filter(|c| c.offer_id == offer_id)
            .map(|c| c.id)
            .collect();
        state.items.retain(|i| !doomed.contains(&i.cavalete_id));
        state.cavaletes.retain(|c| c.offer_id != offer_id);
        Ok(u64::try_from(doomed.len()).unwrap_or(u64::MAX))
    }

    async fn insert_cavalete(
        &mut self,
        offer_id: Uuid,
        cavalete: &UpstreamCavalete,
    ) -> Result<Uuid, DbError> {
        let state = &mut *self.guard;
        if !state.offers.iter().any(|o| o.id == offer_id) {
            return Err(DbError::Constraint("cavaletes_offer_id_fkey".into()));
        }
        if state
            .cavaletes
            .iter()
            .any(|c| c.offer_id == offer_id && c.code == cavalete.codigo && c.block == cavalete.bloco)
        {
            return Err(DbError::Constraint("cavaletes_offer_code_block_key".into()));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        state.cavaletes.push(CavaleteRow {
            id,
            offer_id,
            code: cavalete.codigo.clone(),
            block: cavalete.bloco.clone(),
            material_name: cavalete.nome_material.clone(),
            thickness_name: cavalete.nome_espessura.clone(),
            classification_name: cavalete.nome_classificacao.clone(),
            finish_name: cavalete.nome_acabamento.clone(),
            length: cavalete.comprimento,
            height: cavalete.altura,
            width: cavalete.largura,
            weight: cavalete.peso,
            area: cavalete.metragem,
            area_type: cavalete.tipo_metragem.clone(),
            principal_image: principal_image_json(cavalete),
            item_count: item_count(cavalete),
            approved: false,
            imported: false,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn insert_item(
        &mut self,
        cavalete_id: Uuid,
        item: &UpstreamItem,
    ) -> Result<Uuid, DbError> {
        let state = &mut *self.guard;
        if !state.cavaletes.iter().any(|c| c.id == cavalete_id) {
            return Err(DbError::Constraint("items_cavalete_id_fkey".into()));
        }
        if state.fail_item_code.as_deref() == Some(item.codigo.as_str()) {
            return Err(DbError::Constraint(format!(
                "item {} refused by test hook",
                item.codigo
            )));
        }

        let now = Utc::now();
        let id = Uuid::new_v4();
        state.items.push(ItemRow {
            id,
            cavalete_id,
            code: item.codigo.clone(),
            block: item.bloco.clone(),
            thickness_name: item.nome_espessura.clone(),
            classification_name: item.nome_classificacao.clone(),
            finish_name: item.nome_acabamento.clone(),
            length: item.comprimento,
            height: item.altura,
            width: item.largura,
            weight: item.peso,
            area: item.metragem,
            area_type: item.tipo_metragem.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        let mut this = self;
        this.snapshot = None;
        Ok(())
    }
}
