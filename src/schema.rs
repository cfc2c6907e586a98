//! Product definitions and the assay-name checks run against them.

use crate::error::ChromaSheetError;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Name mismatches between a workbook and its product definition.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Assay {assay:?} not found in product definition. Known assays are {known:?}")]
    UnknownAssay { assay: String, known: Vec<String> },

    #[error("Assays do not match the product assays in fraction data tab {sheet:?}. The sheet contains the following assays not listed in the product: {extra:?}")]
    ExtraAssays { sheet: String, extra: Vec<String> },

    #[error("Given product name {name:?} not found in datasource. Known products are: {known:?}")]
    ProductNotFound { name: String, known: Vec<String> },
}

/// Assays measured for one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSchema {
    pub name: String,
    pub product_component_assays: Vec<String>,
    #[serde(default)]
    pub impurity_assays: Vec<String>,
}

impl ProductSchema {
    /// Reserved component assay that has no row in V2 load and performance blocks.
    pub const STRIP_ASSAY: &'static str = "Strip";

    pub fn new<S: Into<String>>(name: impl Into<String>, components: impl IntoIterator<Item = S>, impurities: impl IntoIterator<Item = S>) -> Self {
        ProductSchema {
            name: name.into(),
            product_component_assays: components.into_iter().map(Into::into).collect(),
            impurity_assays: impurities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_strip(&self) -> bool {
        self.product_component_assays.iter().any(|assay| assay == Self::STRIP_ASSAY)
    }

    pub fn assay_count_without_strip(&self) -> usize {
        self.product_component_assays.len() - usize::from(self.has_strip())
    }
}

/// Source of product definitions.
pub trait ProductCatalog {
    fn find(&self, name: &str) -> Option<ProductSchema>;

    fn names(&self) -> Vec<String>;

    /// Like [`find`](Self::find) but failing with the list of known products.
    fn lookup(&self, name: &str) -> Result<ProductSchema, SchemaError> {
        self.find(name).ok_or_else(|| SchemaError::ProductNotFound {
            name: name.to_owned(),
            known: self.names(),
        })
    }
}

/// Catalog backed by a list held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    products: Vec<ProductSchema>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<ProductSchema>) -> Self {
        InMemoryCatalog { products }
    }

    /// Parses `[{"name": .., "product_component_assays": [..], "impurity_assays": [..]}]`.
    pub fn from_json(json: &str) -> Result<Self, ChromaSheetError> {
        Ok(InMemoryCatalog::new(serde_json::from_str(json)?))
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn find(&self, name: &str) -> Option<ProductSchema> {
        self.products.iter().find(|product| product.name == name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.products.iter().map(|product| product.name.to_owned()).collect()
    }
}

/// Fails unless `assay` is one of `known`.
pub fn check_known_assay(assay: &str, known: &[String]) -> Result<(), SchemaError> {
    if known.iter().any(|name| name == assay) {
        Ok(())
    } else {
        Err(SchemaError::UnknownAssay { assay: assay.to_owned(), known: known.to_vec() })
    }
}

/// Compares assay names found in a fraction sheet with the product's.
/// Extra names are an error; the missing ones are returned for the caller
/// to default.
pub fn validate_assays(expected: &[String], found: &[String], sheet: &str) -> Result<Vec<String>, SchemaError> {
    let extra: Vec<String> = found.iter().filter(|name| !expected.contains(name)).cloned().collect();
    if !extra.is_empty() {
        return Err(SchemaError::ExtraAssays { sheet: sheet.to_owned(), extra });
    }
    Ok(expected.iter().filter(|name| !found.contains(name)).cloned().collect())
}
