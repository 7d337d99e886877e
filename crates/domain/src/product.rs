use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Error, Result};

/// Product category. Closed set; unknown values are rejected at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Car,
    Electricity,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Car => "Car",
            Category::Electricity => "Electricity",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Car" => Ok(Category::Car),
            "Electricity" => Ok(Category::Electricity),
            "" => Err(Error::invalid_argument("category.parse", "category is empty")),
            other => Err(Error::invalid_argument(
                "category.parse",
                format!("unknown category: {other:?}"),
            )),
        }
    }
}

/// A catalog product.
///
/// Identity and timestamps are assigned by the primary store on insert; a
/// freshly validated product carries id `0` and epoch timestamps until then.
/// Products are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: i64,
    title: String,
    description: String,
    price: u64,
    category: Category,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Validating constructor for a not-yet-persisted product.
    ///
    /// Rejects an empty title or description and a zero price; the category
    /// is already typed, so an unknown category never reaches this point.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        price: u64,
        category: Category,
    ) -> Result<Self> {
        const OP: storefront_core::Op = "product.new";

        let title = title.into();
        let description = description.into();

        if title.trim().is_empty() {
            return Err(Error::invalid_argument(OP, "title is empty"));
        }
        if description.trim().is_empty() {
            return Err(Error::invalid_argument(OP, "description is empty"));
        }
        if price == 0 {
            return Err(Error::invalid_argument(OP, "price must be greater than zero"));
        }

        Ok(Self {
            id: 0,
            title,
            description,
            price,
            category,
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        })
    }

    /// Rehydration constructor for store adapters. Store data is
    /// authoritative and is not re-validated.
    pub fn from_stored(
        id: i64,
        title: String,
        description: String,
        price: u64,
        category: Category,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            price,
            category,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::Kind;

    #[test]
    fn new_product_holds_fields_and_defaults() {
        let product = Product::new("Wrench", "A sturdy wrench", 500, Category::Car).unwrap();
        assert_eq!(product.id(), 0);
        assert_eq!(product.title(), "Wrench");
        assert_eq!(product.description(), "A sturdy wrench");
        assert_eq!(product.price(), 500);
        assert_eq!(product.category(), Category::Car);
        assert_eq!(product.created_at(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn new_product_rejects_blank_title() {
        let err = Product::new("   ", "desc", 500, Category::Car).unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
    }

    #[test]
    fn new_product_rejects_blank_description() {
        let err = Product::new("Wrench", "", 500, Category::Car).unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
    }

    #[test]
    fn new_product_rejects_zero_price() {
        let err = Product::new("Wrench", "desc", 0, Category::Car).unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
        assert_eq!(err.root_message(), "price must be greater than zero");
    }

    #[test]
    fn category_parses_declared_values_only() {
        assert_eq!("Car".parse::<Category>().unwrap(), Category::Car);
        assert_eq!(
            "Electricity".parse::<Category>().unwrap(),
            Category::Electricity
        );

        let err = "Groceries".parse::<Category>().unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);

        let err = "".parse::<Category>().unwrap_err();
        assert_eq!(err.kind(), Kind::InvalidArgument);
        assert_eq!(err.root_message(), "category is empty");
    }

    #[test]
    fn category_round_trips_through_display() {
        for category in [Category::Car, Category::Electricity] {
            assert_eq!(
                category.to_string().parse::<Category>().unwrap(),
                category
            );
        }
    }

    #[test]
    fn product_serializes_category_as_plain_string() {
        let product = Product::from_stored(
            7,
            "Cable".to_string(),
            "Two meters".to_string(),
            120,
            Category::Electricity,
            Utc::now(),
            Utc::now(),
        );
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["category"], "Electricity");
        assert_eq!(json["id"], 7);
        assert_eq!(json["price"], 120);
    }
}
