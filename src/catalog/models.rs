use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use super::entity::Entity;
use super::error::CatalogError;
use super::validation::{FieldErrors, NameRule};

const CATEGORY_NAME: NameRule = NameRule::min(3);
const BRAND_NAME: NameRule = NameRule::min(3);
const FOOD_TYPE_NAME: NameRule = NameRule::min(3);
const FOOD_NAME: NameRule = NameRule::between(3, 20);

/// A referenced entity resolved by join in listing views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Uuid,
    pub name: String,
}

// Category

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
}

impl Entity for Category {
    const LABEL: &'static str = "Category";

    type Row = Category;
    type Table = Category;
    type Payload = CategoryPayload;
    type Draft = CategoryDraft;

    fn validate(payload: CategoryPayload) -> Result<CategoryDraft, CatalogError> {
        let mut errors = FieldErrors::default();
        let name = errors.name("name", payload.name.as_deref(), CATEGORY_NAME);
        errors.finish(CategoryDraft { name })
    }
}

// Brand

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Brand {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BrandPayload {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandDraft {
    pub name: String,
}

impl Entity for Brand {
    const LABEL: &'static str = "Brand";

    type Row = Brand;
    type Table = Brand;
    type Payload = BrandPayload;
    type Draft = BrandDraft;

    fn validate(payload: BrandPayload) -> Result<BrandDraft, CatalogError> {
        let mut errors = FieldErrors::default();
        let name = errors.name("name", payload.name.as_deref(), BRAND_NAME);
        errors.finish(BrandDraft { name })
    }
}

// FoodType

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FoodType {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub category: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodTypeTable {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub category: Relation,
    pub name: String,
}

impl<'r> FromRow<'r, PgRow> for FoodTypeTable {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            timestamp: row.try_get("timestamp")?,
            user: row.try_get("user")?,
            category: Relation {
                id: row.try_get("category")?,
                name: row.try_get("category_name")?,
            },
            name: row.try_get("name")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodTypePayload {
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodTypeDraft {
    pub name: String,
    pub category: Uuid,
}

impl Entity for FoodType {
    const LABEL: &'static str = "FoodType";

    type Row = FoodType;
    type Table = FoodTypeTable;
    type Payload = FoodTypePayload;
    type Draft = FoodTypeDraft;

    fn validate(payload: FoodTypePayload) -> Result<FoodTypeDraft, CatalogError> {
        let mut errors = FieldErrors::default();
        let category = errors.reference("category", payload.category.as_deref())?;
        let name = errors.name("name", payload.name.as_deref(), FOOD_TYPE_NAME);
        errors.finish(FoodTypeDraft { name, category })
    }
}

// Food

/// Nutrition values per food, all in the unit the client supplies (kcal or grams).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Nutrition {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub saturated: f64,
    pub unsaturated: f64,
    pub fiber: f64,
    pub sugars: f64,
}

impl Nutrition {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            kcal: row.try_get("kcal")?,
            protein: row.try_get("protein")?,
            carbs: row.try_get("carbs")?,
            fat: row.try_get("fat")?,
            saturated: row.try_get("saturated")?,
            unsaturated: row.try_get("unsaturated")?,
            fiber: row.try_get("fiber")?,
            sugars: row.try_get("sugars")?,
        })
    }

    fn validated(self, errors: &mut FieldErrors) -> Self {
        Self {
            kcal: errors.nutrient("kcal", self.kcal),
            protein: errors.nutrient("protein", self.protein),
            carbs: errors.nutrient("carbs", self.carbs),
            fat: errors.nutrient("fat", self.fat),
            saturated: errors.nutrient("saturated", self.saturated),
            unsaturated: errors.nutrient("unsaturated", self.unsaturated),
            fiber: errors.nutrient("fiber", self.fiber),
            sugars: errors.nutrient("sugars", self.sugars),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub foodtype: Uuid,
    pub brand: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
}

impl<'r> FromRow<'r, PgRow> for Food {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            timestamp: row.try_get("timestamp")?,
            user: row.try_get("user")?,
            foodtype: row.try_get("food_type")?,
            brand: row.try_get("brand")?,
            name: row.try_get("name")?,
            nutrition: Nutrition::from_row(row)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodTable {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user: Uuid,
    pub foodtype: Relation,
    pub brand: Relation,
    pub name: String,
    #[serde(flatten)]
    pub nutrition: Nutrition,
}

impl<'r> FromRow<'r, PgRow> for FoodTable {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            timestamp: row.try_get("timestamp")?,
            user: row.try_get("user")?,
            foodtype: Relation {
                id: row.try_get("food_type")?,
                name: row.try_get("food_type_name")?,
            },
            brand: Relation {
                id: row.try_get("brand")?,
                name: row.try_get("brand_name")?,
            },
            name: row.try_get("name")?,
            nutrition: Nutrition::from_row(row)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodPayload {
    pub name: Option<String>,
    pub foodtype: Option<String>,
    pub brand: Option<String>,
    #[serde(flatten)]
    pub nutrition: Nutrition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FoodDraft {
    pub name: String,
    pub food_type: Uuid,
    pub brand: Uuid,
    pub nutrition: Nutrition,
}

impl Entity for Food {
    const LABEL: &'static str = "Food";

    type Row = Food;
    type Table = FoodTable;
    type Payload = FoodPayload;
    type Draft = FoodDraft;

    fn validate(payload: FoodPayload) -> Result<FoodDraft, CatalogError> {
        let mut errors = FieldErrors::default();
        let food_type = errors.reference("foodtype", payload.foodtype.as_deref())?;
        let brand = errors.reference("brand", payload.brand.as_deref())?;
        let name = errors.name("name", payload.name.as_deref(), FOOD_NAME);
        let nutrition = payload.nutrition.validated(&mut errors);
        errors.finish(FoodDraft {
            name,
            food_type,
            brand,
            nutrition,
        })
    }
}
