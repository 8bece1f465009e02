//! The fixed set of expense categories.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// A parse error for strings that are not one of the category keywords.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid expense category")]
pub struct ParseCategoryError(pub String);

/// The category of an expense.
///
/// Categories are a fixed set, stored in the database as the lowercase
/// keyword (e.g. "food").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Food and dining.
    Food,
    /// Buses, trains, fuel and the like.
    Transportation,
    /// General shopping.
    Shopping,
    /// Entertainment.
    Entertainment,
    /// Bills and utilities.
    Bills,
    /// Healthcare.
    Healthcare,
    /// Education.
    Education,
    /// Travel.
    Travel,
    /// Anything that does not fit the other categories.
    Other,
}

impl Category {
    /// All categories in display order, used to render the category select.
    pub const ALL: [Category; 9] = [
        Category::Food,
        Category::Transportation,
        Category::Shopping,
        Category::Entertainment,
        Category::Bills,
        Category::Healthcare,
        Category::Education,
        Category::Travel,
        Category::Other,
    ];

    /// The keyword stored in the database and used as the form value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transportation => "transportation",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Bills => "bills",
            Category::Healthcare => "healthcare",
            Category::Education => "education",
            Category::Travel => "travel",
            Category::Other => "other",
        }
    }

    /// The human readable label shown in forms and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food & Dining",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills & Utilities",
            Category::Healthcare => "Healthcare",
            Category::Education => "Education",
            Category::Travel => "Travel",
            Category::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "food" => Ok(Category::Food),
            "transportation" => Ok(Category::Transportation),
            "shopping" => Ok(Category::Shopping),
            "entertainment" => Ok(Category::Entertainment),
            "bills" => Ok(Category::Bills),
            "healthcare" => Ok(Category::Healthcare),
            "education" => Ok(Category::Education),
            "travel" => Ok(Category::Travel),
            "other" => Ok(Category::Other),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod category_tests {
    use super::{Category, ParseCategoryError};

    #[test]
    fn round_trips_through_keyword() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();

            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn parse_fails_on_unknown_keyword() {
        let result = "groceries".parse::<Category>();

        assert_eq!(result, Err(ParseCategoryError("groceries".to_string())));
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("Food".parse::<Category>().is_err());
    }
}
