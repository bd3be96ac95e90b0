use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cube::error::{MapMakerError, MapMakerResult};
use crate::map::MapKey;

/// Map products a [`MapMakerObs`](crate::cube::MapMakerObs) can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Counts,
    Exposure,
    Background,
}

impl Product {
    pub const ALL: [Product; 3] = [Product::Counts, Product::Exposure, Product::Background];

    pub fn name(self) -> &'static str {
        self.key().as_str()
    }

    pub fn key(self) -> MapKey {
        match self {
            Product::Counts => MapKey::Counts,
            Product::Exposure => MapKey::Exposure,
            Product::Background => MapKey::Background,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Product {
    type Err = MapMakerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .into_iter()
            .find(|product| product.name() == name)
            .ok_or_else(|| MapMakerError::UnknownSelection(name.to_string()))
    }
}

/// Validated, ordered and duplicate-free subset of [`Product::ALL`].
///
/// Deserializes from a list of names; a bare string or any other non-list
/// value is a [`MapMakerError::SelectionType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Vec<Product>")]
pub struct Selection {
    products: Vec<Product>,
}

impl Selection {
    pub fn all() -> Self {
        Self::new(Product::ALL)
    }

    /// Keeps the first occurrence of each product.
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        let mut unique = Vec::with_capacity(Product::ALL.len());
        for product in products {
            if !unique.contains(&product) {
                unique.push(product);
            }
        }
        Self { products: unique }
    }

    pub fn from_names<I, S>(names: I) -> MapMakerResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let products = names
            .into_iter()
            .map(|name| name.as_ref().parse::<Product>())
            .collect::<MapMakerResult<Vec<_>>>()?;
        Ok(Self::new(products))
    }

    /// Selection from untyped input. `null` selects everything.
    pub fn from_json(value: &Value) -> MapMakerResult<Self> {
        match value {
            Value::Null => Ok(Self::all()),
            Value::Array(items) => {
                let products = items
                    .iter()
                    .map(|item| match item {
                        Value::String(name) => name.parse::<Product>(),
                        other => Err(MapMakerError::UnknownSelection(other.to_string())),
                    })
                    .collect::<MapMakerResult<Vec<_>>>()?;
                Ok(Self::new(products))
            }
            other => Err(MapMakerError::SelectionType(other.to_string())),
        }
    }

    /// The given selection, or every product when none is given.
    pub fn resolve(selection: Option<&Selection>) -> Selection {
        selection.cloned().unwrap_or_else(Selection::all)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn keys(&self) -> Vec<MapKey> {
        self.products.iter().map(|product| product.key()).collect()
    }

    pub fn contains(&self, product: Product) -> bool {
        self.products.contains(&product)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Value> for Selection {
    type Error = MapMakerError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value)
    }
}

impl From<Selection> for Vec<Product> {
    fn from(selection: Selection) -> Self {
        selection.products
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn none_means_everything() {
        let selection = Selection::resolve(None);
        assert_eq!(selection.products(), &Product::ALL);
        assert_eq!(Selection::from_json(&Value::Null).unwrap(), selection);
    }

    #[test]
    fn names_are_validated_and_deduplicated() {
        let selection = Selection::from_names(["background", "counts", "background"]).unwrap();
        assert_eq!(
            selection.keys(),
            vec![MapKey::Background, MapKey::Counts]
        );
        assert!(!selection.contains(Product::Exposure));
    }

    #[test]
    fn bare_string_is_a_type_error() {
        let err = Selection::from_json(&json!("counts")).unwrap_err();
        assert!(matches!(err, MapMakerError::SelectionType(_)));
    }

    #[test]
    fn unknown_name_is_reported() {
        let err = Selection::from_json(&json!(["flux"])).unwrap_err();
        assert_eq!(err, MapMakerError::UnknownSelection("flux".to_string()));

        let err = Selection::from_json(&json!(["counts", "flux"])).unwrap_err();
        assert_eq!(err, MapMakerError::UnknownSelection("flux".to_string()));
    }

    #[test]
    fn serde_goes_through_validation() {
        let selection: Selection = serde_json::from_str(r#"["exposure"]"#).unwrap();
        assert_eq!(selection.products(), &[Product::Exposure]);
        assert_eq!(serde_json::to_string(&selection).unwrap(), r#"["exposure"]"#);

        assert!(serde_json::from_str::<Selection>(r#""exposure""#).is_err());
        assert!(serde_json::from_str::<Selection>(r#"["flux"]"#).is_err());
    }

    #[test]
    fn empty_list_selects_nothing() {
        let selection = Selection::from_json(&json!([])).unwrap();
        assert!(selection.products().is_empty());
    }
}
