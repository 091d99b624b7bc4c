//! Row types and read queries for `offers`, `cavaletes`, and `items`.

use chrono::{DateTime, Utc};
use mobsync_core::CanonicalId;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::ChildCounts;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `offers` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub canonical_id: String,
    pub status: String,
    pub company_name: String,
    pub logo_url: String,
    /// The provider document exactly as fetched on the last import.
    pub raw_document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing projection of an offer, without the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct OfferSummaryRow {
    pub id: Uuid,
    pub canonical_id: String,
    pub status: String,
    pub company_name: String,
    pub cavalete_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `cavaletes` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CavaleteRow {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub code: String,
    pub block: String,
    pub material_name: String,
    pub thickness_name: String,
    pub classification_name: Option<String>,
    pub finish_name: Option<String>,
    pub length: Option<Decimal>,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub area: Option<Decimal>,
    pub area_type: Option<String>,
    /// `{nome, url, urlMin}`; `NULL` when the provider sent no usable image.
    pub principal_image: Option<serde_json::Value>,
    pub item_count: i32,
    pub approved: bool,
    pub imported: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `items` table.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub cavalete_id: Uuid,
    pub code: String,
    pub block: String,
    pub thickness_name: String,
    pub classification_name: String,
    pub finish_name: Option<String>,
    pub length: Option<Decimal>,
    pub height: Option<Decimal>,
    pub width: Option<Decimal>,
    pub weight: Option<Decimal>,
    pub area: Option<Decimal>,
    pub area_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CavaleteTree {
    #[serde(flatten)]
    pub cavalete: CavaleteRow,
    pub items: Vec<ItemRow>,
}

/// An offer with all of its cavaletes and their items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferTree {
    #[serde(flatten)]
    pub offer: OfferRow,
    pub cavaletes: Vec<CavaleteTree>,
}

impl OfferTree {
    /// Assembles a tree from flat rows. Items whose cavalete is not in
    /// `cavaletes` are dropped.
    #[must_use]
    pub fn assemble(offer: OfferRow, cavaletes: Vec<CavaleteRow>, items: Vec<ItemRow>) -> Self {
        let mut trees: Vec<CavaleteTree> = cavaletes
            .into_iter()
            .map(|cavalete| CavaleteTree {
                cavalete,
                items: Vec::new(),
            })
            .collect();

        for item in items {
            if let Some(tree) = trees
                .iter_mut()
                .find(|t| t.cavalete.id == item.cavalete_id)
            {
                tree.items.push(item);
            }
        }

        Self {
            offer,
            cavaletes: trees,
        }
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.cavaletes.iter().map(|c| c.items.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Read queries
// ---------------------------------------------------------------------------

/// Returns the internal id of the offer stored under `canonical_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_offer_id(
    pool: &PgPool,
    canonical_id: &CanonicalId,
) -> Result<Option<Uuid>, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM offers WHERE canonical_id = $1")
        .bind(canonical_id.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Returns the most recently updated offers, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_offers(pool: &PgPool, limit: i64) -> Result<Vec<OfferSummaryRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferSummaryRow>(
        "SELECT o.id, o.canonical_id, o.status, o.company_name, \
                (SELECT COUNT(*) FROM cavaletes c WHERE c.offer_id = o.id) AS cavalete_count, \
                o.created_at, o.updated_at \
         FROM offers o \
         ORDER BY o.updated_at DESC, o.id \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Loads one offer with all of its cavaletes and items.
///
/// Cavaletes and items come back in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn get_offer_tree(pool: &PgPool, offer_id: Uuid) -> Result<Option<OfferTree>, DbError> {
    let Some(offer) = sqlx::query_as::<_, OfferRow>(
        "SELECT id, canonical_id, status, company_name, logo_url, raw_document, \
                created_at, updated_at \
         FROM offers WHERE id = $1",
    )
    .bind(offer_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let cavaletes = sqlx::query_as::<_, CavaleteRow>(
        "SELECT id, offer_id, code, block, material_name, thickness_name, \
                classification_name, finish_name, length, height, width, weight, \
                area, area_type, principal_image, item_count, approved, imported, \
                created_at, updated_at \
         FROM cavaletes WHERE offer_id = $1 \
         ORDER BY seq",
    )
    .bind(offer_id)
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, ItemRow>(
        "SELECT i.id, i.cavalete_id, i.code, i.block, i.thickness_name, \
                i.classification_name, i.finish_name, i.length, i.height, i.width, \
                i.weight, i.area, i.area_type, i.created_at, i.updated_at \
         FROM items i \
         JOIN cavaletes c ON c.id = i.cavalete_id \
         WHERE c.offer_id = $1 \
         ORDER BY c.seq, i.seq",
    )
    .bind(offer_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(OfferTree::assemble(offer, cavaletes, items)))
}

/// Counts the cavaletes and items stored under `offer_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_children(pool: &PgPool, offer_id: Uuid) -> Result<ChildCounts, DbError> {
    let (cavaletes, items): (i64, i64) = sqlx::query_as(
        "SELECT \
             (SELECT COUNT(*) FROM cavaletes WHERE offer_id = $1), \
             (SELECT COUNT(*) FROM items i JOIN cavaletes c ON c.id = i.cavalete_id \
              WHERE c.offer_id = $1)",
    )
    .bind(offer_id)
    .fetch_one(pool)
    .await?;
    Ok(ChildCounts { cavaletes, items })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer_row() -> OfferRow {
        OfferRow {
            id: Uuid::new_v4(),
            canonical_id: "cae15fe7-86a3-4a7b-9a4d-5ed91ae6d568".into(),
            status: "ativa".into(),
            company_name: "Acme".into(),
            logo_url: String::new(),
            raw_document: serde_json::json!({"situacao": "ativa"}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cavalete_row(offer_id: Uuid, code: &str) -> CavaleteRow {
        CavaleteRow {
            id: Uuid::new_v4(),
            offer_id,
            code: code.into(),
            block: String::new(),
            material_name: String::new(),
            thickness_name: String::new(),
            classification_name: None,
            finish_name: None,
            length: None,
            height: None,
            width: None,
            weight: None,
            area: None,
            area_type: None,
            principal_image: None,
            item_count: 0,
            approved: false,
            imported: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item_row(cavalete_id: Uuid, code: &str) -> ItemRow {
        ItemRow {
            id: Uuid::new_v4(),
            cavalete_id,
            code: code.into(),
            block: String::new(),
            thickness_name: String::new(),
            classification_name: String::new(),
            finish_name: None,
            length: None,
            height: None,
            width: None,
            weight: None,
            area: None,
            area_type: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_groups_items_under_their_cavalete() {
        let offer = offer_row();
        let a = cavalete_row(offer.id, "C-1");
        let b = cavalete_row(offer.id, "C-2");
        let items = vec![
            item_row(a.id, "I-1"),
            item_row(b.id, "I-2"),
            item_row(a.id, "I-3"),
            item_row(Uuid::new_v4(), "stray"),
        ];

        let tree = OfferTree::assemble(offer, vec![a, b], items);

        assert_eq!(tree.cavaletes.len(), 2);
        assert_eq!(tree.cavaletes[0].items.len(), 2);
        assert_eq!(tree.cavaletes[0].items[1].code, "I-3");
        assert_eq!(tree.cavaletes[1].items.len(), 1);
        assert_eq!(tree.item_count(), 3);
    }

    #[test]
    fn tree_serializes_flat_offer_fields() {
        let offer = offer_row();
        let cav = cavalete_row(offer.id, "C-1");
        let tree = OfferTree::assemble(offer, vec![cav], vec![]);
        let value = serde_json::to_value(&tree).unwrap();

        assert_eq!(value["company_name"], "Acme");
        assert_eq!(value["cavaletes"][0]["code"], "C-1");
        assert!(value["cavaletes"][0]["items"].as_array().unwrap().is_empty());
    }
}
