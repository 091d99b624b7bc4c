//! Postgres implementation of the offer store.

use async_trait::async_trait;
use mobsync_core::{CanonicalId, UpstreamCavalete, UpstreamItem, UpstreamOffer};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::store::{item_count, principal_image_json, ChildCounts, OfferStore, OfferTransaction};
use crate::{offers, DbError};

#[derive(Debug, Clone)]
pub struct PgOfferStore {
    pool: PgPool,
}

impl PgOfferStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OfferStore for PgOfferStore {
    async fn find_offer_id(&self, canonical_id: &CanonicalId) -> Result<Option<Uuid>, DbError> {
        offers::find_offer_id(&self.pool, canonical_id).await
    }

    async fn count_children(&self, offer_id: Uuid) -> Result<ChildCounts, DbError> {
        offers::count_children(&self.pool, offer_id).await
    }

    async fn begin(&self) -> Result<Box<dyn OfferTransaction>, DbError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgOfferTransaction { tx }))
    }
}

/// A write transaction on one pooled connection. sqlx rolls it back when
/// dropped uncommitted.
pub struct PgOfferTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OfferTransaction for PgOfferTransaction {
    async fn lock_identifier(&mut self, canonical_id: &CanonicalId) -> Result<(), DbError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(canonical_id.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_offer_id(
        &mut self,
        canonical_id: &CanonicalId,
    ) -> Result<Option<Uuid>, DbError> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM offers WHERE canonical_id = $1")
            .bind(canonical_id.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(id)
    }

    async fn insert_offer(
        &mut self,
        canonical_id: &CanonicalId,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO offers \
                 (id, canonical_id, status, company_name, logo_url, raw_document) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(canonical_id.as_str())
        .bind(&offer.situacao)
        .bind(&offer.nome_empresa)
        .bind(&offer.url_logo)
        .bind(raw_document)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;
        Ok(id)
    }

    async fn update_offer(
        &mut self,
        offer_id: Uuid,
        offer: &UpstreamOffer,
        raw_document: &serde_json::Value,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            "UPDATE offers SET \
                 status       = $2, \
                 company_name = $3, \
                 logo_url     = $4, \
                 raw_document = $5, \
                 updated_at   = NOW() \
             WHERE id = $1",
        )
        .bind(offer_id)
        .bind(&offer.situacao)
        .bind(&offer.nome_empresa)
        .bind(&offer.url_logo)
        .bind(raw_document)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_children(&mut self, offer_id: Uuid) -> Result<u64, DbError> {
        sqlx::query(
            "DELETE FROM items \
             WHERE cavalete_id IN (SELECT id FROM cavaletes WHERE offer_id = $1)",
        )
        .bind(offer_id)
        .execute(&mut *self.tx)
        .await?;

        let removed = sqlx::query("DELETE FROM cavaletes WHERE offer_id = $1")
            .bind(offer_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        tracing::debug!(%offer_id, removed, "deleted offer children");
        Ok(removed)
    }

    async fn insert_cavalete(
        &mut self,
        offer_id: Uuid,
        cavalete: &UpstreamCavalete,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO cavaletes \
                 (id, offer_id, code, block, material_name, thickness_name, \
                  classification_name, finish_name, length, height, width, weight, \
                  area, area_type, principal_image, item_count) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                     $7, $8, $9, $10, $11, $12, \
                     $13, $14, $15, $16)",
        )
        .bind(id)
        .bind(offer_id)
        .bind(&cavalete.codigo)
        .bind(&cavalete.bloco)
        .bind(&cavalete.nome_material)
        .bind(&cavalete.nome_espessura)
        .bind(&cavalete.nome_classificacao)
        .bind(&cavalete.nome_acabamento)
        .bind(cavalete.comprimento)
        .bind(cavalete.altura)
        .bind(cavalete.largura)
        .bind(cavalete.peso)
        .bind(cavalete.metragem)
        .bind(&cavalete.tipo_metragem)
        .bind(principal_image_json(cavalete))
        .bind(item_count(cavalete))
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;
        Ok(id)
    }

    async fn insert_item(
        &mut self,
        cavalete_id: Uuid,
        item: &UpstreamItem,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO items \
                 (id, cavalete_id, code, block, thickness_name, classification_name, \
                  finish_name, length, height, width, weight, area, area_type) \
             VALUES ($1, $2, $3, $4, $5, $6, \
                     $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(id)
        .bind(cavalete_id)
        .bind(&item.codigo)
        .bind(&item.bloco)
        .bind(&item.nome_espessura)
        .bind(&item.nome_classificacao)
        .bind(&item.nome_acabamento)
        .bind(item.comprimento)
        .bind(item.altura)
        .bind(item.largura)
        .bind(item.peso)
        .bind(item.metragem)
        .bind(&item.tipo_metragem)
        .execute(&mut *self.tx)
        .await
        .map_err(DbError::from_write)?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        self.tx.commit().await?;
        Ok(())
    }
}
