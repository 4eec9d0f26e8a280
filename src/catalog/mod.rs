pub mod entity;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

pub use entity::Entity;
pub use error::CatalogError;
pub use models::{
    Brand, BrandDraft, Category, CategoryDraft, Food, FoodDraft, FoodTable, FoodType,
    FoodTypeDraft, FoodTypeTable, Nutrition, Relation,
};
pub use store::{CatalogStore, Readiness};
