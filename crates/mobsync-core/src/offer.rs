//! Typed projection of the Mobgran `link-produto` document.
//!
//! ## Observed shape
//!
//! The provider returns camelCase keys. Only the fields persisted as columns
//! are modelled here; everything else (`blocos`, `chapas`, `blocosComChapas`,
//! `blocosMarcados`, ...) survives only in the verbatim JSON kept next to the
//! offer row.
//!
//! - Text fields are sometimes `null` instead of `""`; both decode to `""`.
//! - Dimensions arrive as JSON numbers. They decode into [`Decimal`] exactly as
//!   written and stay `None` when absent or `null`. Absent is never stored as zero.
//! - `imagemPrincipal` may be missing, `null`, or an object whose fields are all
//!   empty strings. The last case is treated the same as missing.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamOffer {
    /// Lifecycle status, e.g. `"ativa"`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub situacao: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome_empresa: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_logo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cavaletes: Vec<UpstreamCavalete>,
}

impl UpstreamOffer {
    /// Total number of items across every cavalete.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.cavaletes.iter().map(|c| c.itens.len()).sum()
    }
}

/// A group of slabs sold together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamCavalete {
    #[serde(default, deserialize_with = "null_as_default")]
    pub codigo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bloco: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome_material: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome_espessura: String,
    #[serde(default)]
    pub nome_classificacao: Option<String>,
    #[serde(default)]
    pub nome_acabamento: Option<String>,
    #[serde(default)]
    pub comprimento: Option<Decimal>,
    #[serde(default)]
    pub altura: Option<Decimal>,
    #[serde(default)]
    pub largura: Option<Decimal>,
    #[serde(default)]
    pub peso: Option<Decimal>,
    /// Area ("metragem") as computed by the provider.
    #[serde(default)]
    pub metragem: Option<Decimal>,
    #[serde(default)]
    pub tipo_metragem: Option<String>,
    #[serde(default)]
    pub imagem_principal: Option<PrincipalImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub itens: Vec<UpstreamItem>,
}

impl UpstreamCavalete {
    /// The principal image, unless it is missing or entirely blank.
    #[must_use]
    pub fn principal_image(&self) -> Option<&PrincipalImage> {
        self.imagem_principal.as_ref().filter(|img| !img.is_blank())
    }
}

/// A single slab inside a cavalete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub codigo: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bloco: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome_espessura: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome_classificacao: String,
    #[serde(default)]
    pub nome_acabamento: Option<String>,
    #[serde(default)]
    pub comprimento: Option<Decimal>,
    #[serde(default)]
    pub altura: Option<Decimal>,
    #[serde(default)]
    pub largura: Option<Decimal>,
    #[serde(default)]
    pub peso: Option<Decimal>,
    #[serde(default)]
    pub metragem: Option<Decimal>,
    #[serde(default)]
    pub tipo_metragem: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nome: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url_min: String,
}

impl PrincipalImage {
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.nome.is_empty() && self.url.is_empty() && self.url_min.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_full_document() {
        let doc: UpstreamOffer = serde_json::from_value(json!({
            "situacao": "ativa",
            "nomeEmpresa": "Granitos Vitória",
            "urlLogo": "https://cdn.mobgran.com/logo.png",
            "blocos": [],
            "cavaletes": [{
                "codigo": "C-01",
                "bloco": "B-77",
                "nomeMaterial": "Branco Itaúnas",
                "nomeEspessura": "2cm",
                "comprimento": 3.15,
                "altura": 1.92,
                "metragem": 6.048,
                "imagemPrincipal": {"nome": "foto", "url": "https://x/y.jpg", "urlMin": "https://x/y_min.jpg"},
                "itens": [
                    {"codigo": "I-1", "bloco": "B-77", "nomeEspessura": "2cm", "nomeClassificacao": "A",
                     "comprimento": 3.15, "altura": 1.92, "metragem": 6.048}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(doc.situacao, "ativa");
        assert_eq!(doc.cavaletes.len(), 1);
        let cav = &doc.cavaletes[0];
        assert_eq!(cav.comprimento, Some(Decimal::from_str("3.15").unwrap()));
        assert_eq!(cav.metragem, Some(Decimal::from_str("6.048").unwrap()));
        assert_eq!(cav.largura, None);
        assert!(cav.principal_image().is_some());
        assert_eq!(cav.itens[0].nome_classificacao, "A");
        assert_eq!(doc.item_count(), 1);
    }

    #[test]
    fn absent_dimensions_stay_absent() {
        let item: UpstreamItem =
            serde_json::from_value(json!({"codigo": "I-1", "comprimento": null})).unwrap();
        assert_eq!(item.comprimento, None);
        assert_eq!(item.altura, None);
        assert_eq!(item.metragem, None);
    }

    #[test]
    fn null_text_and_lists_decode_to_empty() {
        let doc: UpstreamOffer = serde_json::from_value(json!({
            "situacao": null,
            "nomeEmpresa": "Acme",
            "cavaletes": [{"codigo": "C-9", "nomeMaterial": null, "itens": null}]
        }))
        .unwrap();
        assert_eq!(doc.situacao, "");
        assert_eq!(doc.url_logo, "");
        assert_eq!(doc.cavaletes[0].nome_material, "");
        assert!(doc.cavaletes[0].itens.is_empty());
    }

    #[test]
    fn blank_principal_image_is_ignored() {
        let cav: UpstreamCavalete = serde_json::from_value(json!({
            "codigo": "C-1",
            "imagemPrincipal": {"nome": "", "url": "", "urlMin": ""}
        }))
        .unwrap();
        assert!(cav.imagem_principal.is_some());
        assert!(cav.principal_image().is_none());
    }

    #[test]
    fn principal_image_serializes_camel_case() {
        let img = PrincipalImage {
            nome: "foto".into(),
            url: "https://x/y.jpg".into(),
            url_min: "https://x/y_min.jpg".into(),
        };
        let value = serde_json::to_value(&img).unwrap();
        assert_eq!(value["urlMin"], "https://x/y_min.jpg");
    }

    #[test]
    fn item_count_sums_across_cavaletes() {
        let doc = UpstreamOffer {
            cavaletes: vec![
                UpstreamCavalete {
                    itens: vec![UpstreamItem::default(); 3],
                    ..UpstreamCavalete::default()
                },
                UpstreamCavalete {
                    itens: vec![UpstreamItem::default()],
                    ..UpstreamCavalete::default()
                },
            ],
            ..UpstreamOffer::default()
        };
        assert_eq!(doc.item_count(), 4);
    }
}
