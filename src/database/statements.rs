use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use crate::catalog::{Brand, Category, Entity, Food, FoodType};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// The parameterized SQL behind each catalog operation for one entity.
///
/// Parameter layout:
/// - `SELECT_PAGE`: `$1` limit, `$2` offset
/// - `SELECT_ONE`, `DELETE`: `$1` id
/// - `INSERT`: `$1` id, `$2` timestamp, `$3` user, then the draft fields
/// - `UPDATE`: `$1` id, then the draft fields
pub trait PgEntity: Entity {
    const SELECT_PAGE: &'static str;
    const SELECT_ONE: &'static str;
    const COUNT: &'static str;
    const INSERT: &'static str;
    const UPDATE: &'static str;
    const DELETE: &'static str;

    /// What a foreign key violation on insert or update refers to.
    const REFERENCES: &'static str;

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &'q Self::Draft) -> PgQuery<'q>;

    fn insert<'q>(id: Uuid, timestamp: DateTime<Utc>, user: Uuid, draft: &'q Self::Draft) -> PgQuery<'q> {
        let query = sqlx::query(Self::INSERT).bind(id).bind(timestamp).bind(user);
        Self::bind_draft(query, draft)
    }

    fn update<'q>(id: Uuid, draft: &'q Self::Draft) -> PgQuery<'q> {
        Self::bind_draft(sqlx::query(Self::UPDATE).bind(id), draft)
    }
}

impl PgEntity for Category {
    const SELECT_PAGE: &'static str = r#"
        SELECT id, "timestamp", "user", name
        FROM core.category
        ORDER BY "timestamp", id
        LIMIT $1 OFFSET $2
    "#;
    const SELECT_ONE: &'static str =
        r#"SELECT id, "timestamp", "user", name FROM core.category WHERE id = $1"#;
    const COUNT: &'static str = "SELECT COUNT(*) FROM core.category";
    const INSERT: &'static str =
        r#"INSERT INTO core.category (id, "timestamp", "user", name) VALUES ($1, $2, $3, $4)"#;
    const UPDATE: &'static str = "UPDATE core.category SET name = $2 WHERE id = $1";
    const DELETE: &'static str = "DELETE FROM core.category WHERE id = $1";
    const REFERENCES: &'static str = "category";

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &'q Self::Draft) -> PgQuery<'q> {
        query.bind(&draft.name)
    }
}

impl PgEntity for Brand {
    const SELECT_PAGE: &'static str = r#"
        SELECT id, "timestamp", "user", name
        FROM core.brand
        ORDER BY "timestamp", id
        LIMIT $1 OFFSET $2
    "#;
    const SELECT_ONE: &'static str =
        r#"SELECT id, "timestamp", "user", name FROM core.brand WHERE id = $1"#;
    const COUNT: &'static str = "SELECT COUNT(*) FROM core.brand";
    const INSERT: &'static str =
        r#"INSERT INTO core.brand (id, "timestamp", "user", name) VALUES ($1, $2, $3, $4)"#;
    const UPDATE: &'static str = "UPDATE core.brand SET name = $2 WHERE id = $1";
    const DELETE: &'static str = "DELETE FROM core.brand WHERE id = $1";
    const REFERENCES: &'static str = "brand";

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &'q Self::Draft) -> PgQuery<'q> {
        query.bind(&draft.name)
    }
}

impl PgEntity for FoodType {
    const SELECT_PAGE: &'static str = r#"
        SELECT ft.id, ft."timestamp", ft."user", ft.category, c.name AS category_name, ft.name
        FROM core.food_type ft
        JOIN core.category c ON c.id = ft.category
        ORDER BY ft."timestamp", ft.id
        LIMIT $1 OFFSET $2
    "#;
    const SELECT_ONE: &'static str =
        r#"SELECT id, "timestamp", "user", category, name FROM core.food_type WHERE id = $1"#;
    const COUNT: &'static str = "SELECT COUNT(*) FROM core.food_type";
    const INSERT: &'static str = r#"
        INSERT INTO core.food_type (id, "timestamp", "user", name, category)
        VALUES ($1, $2, $3, $4, $5)
    "#;
    const UPDATE: &'static str = "UPDATE core.food_type SET name = $2, category = $3 WHERE id = $1";
    const DELETE: &'static str = "DELETE FROM core.food_type WHERE id = $1";
    const REFERENCES: &'static str = "category";

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &'q Self::Draft) -> PgQuery<'q> {
        query.bind(&draft.name).bind(draft.category)
    }
}

impl PgEntity for Food {
    const SELECT_PAGE: &'static str = r#"
        SELECT f.id, f."timestamp", f."user", f.food_type, ft.name AS food_type_name,
               f.brand, b.name AS brand_name, f.name,
               f.kcal, f.protein, f.carbs, f.fat, f.saturated, f.unsaturated, f.fiber, f.sugars
        FROM core.food f
        JOIN core.food_type ft ON ft.id = f.food_type
        JOIN core.brand b ON b.id = f.brand
        ORDER BY f."timestamp", f.id
        LIMIT $1 OFFSET $2
    "#;
    const SELECT_ONE: &'static str = r#"
        SELECT id, "timestamp", "user", food_type, brand, name,
               kcal, protein, carbs, fat, saturated, unsaturated, fiber, sugars
        FROM core.food
        WHERE id = $1
    "#;
    const COUNT: &'static str = "SELECT COUNT(*) FROM core.food";
    const INSERT: &'static str = r#"
        INSERT INTO core.food (
            id, "timestamp", "user", name, food_type, brand,
            kcal, protein, carbs, fat, saturated, unsaturated, fiber, sugars
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
    "#;
    const UPDATE: &'static str = r#"
        UPDATE core.food
        SET name = $2, food_type = $3, brand = $4,
            kcal = $5, protein = $6, carbs = $7, fat = $8,
            saturated = $9, unsaturated = $10, fiber = $11, sugars = $12
        WHERE id = $1
    "#;
    const DELETE: &'static str = "DELETE FROM core.food WHERE id = $1";
    const REFERENCES: &'static str = "foodtype or brand";

    fn bind_draft<'q>(query: PgQuery<'q>, draft: &'q Self::Draft) -> PgQuery<'q> {
        let n = &draft.nutrition;
        query
            .bind(&draft.name)
            .bind(draft.food_type)
            .bind(draft.brand)
            .bind(n.kcal)
            .bind(n.protein)
            .bind(n.carbs)
            .bind(n.fat)
            .bind(n.saturated)
            .bind(n.unsaturated)
            .bind(n.fiber)
            .bind(n.sugars)
    }
}
