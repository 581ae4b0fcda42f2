use sea_orm::{entity::prelude::*, ActiveValue::NotSet, DatabaseConnection, FromQueryResult, QueryOrder, QuerySelect, Select, Set};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Width of the `htmlCode` column.
pub const HTML_CODE_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "icon")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_name = "htmlCode", column_type = "String(StringLen::N(6))", unique)]
    #[serde(rename = "htmlCode")]
    pub html_code: String,
    #[sea_orm(column_type = "Text")]
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    // never written by any operation; kept so the row shape matches the table
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Read projection: timestamps are never exposed by list/get.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize, Deserialize)]
pub struct IconView {
    pub id: i32,
    #[serde(rename = "htmlCode")]
    pub html_code: String,
    pub name: String,
}

impl From<Model> for IconView {
    fn from(m: Model) -> Self {
        Self { id: m.id, html_code: m.html_code, name: m.name }
    }
}

pub fn validate_html_code(html_code: &str) -> Result<(), ModelError> {
    if html_code.trim().is_empty() {
        return Err(ModelError::Validation("htmlCode required".into()));
    }
    if html_code.chars().count() > HTML_CODE_LEN {
        return Err(ModelError::Validation(format!("htmlCode longer than {HTML_CODE_LEN} characters")));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("name required".into())); }
    Ok(())
}

fn view_select() -> Select<Entity> {
    Entity::find()
        .select_only()
        .column(Column::Id)
        .column_as(Column::HtmlCode, "html_code")
        .column(Column::Name)
}

/// Insert a new icon; `created_at` is stamped here.
pub async fn create(db: &DatabaseConnection, html_code: &str, name: &str) -> Result<Model, ModelError> {
    validate_html_code(html_code)?;
    validate_name(name)?;
    let am = ActiveModel {
        id: NotSet,
        html_code: Set(html_code.to_string()),
        name: Set(name.to_string()),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
        deleted_at: Set(None),
    };
    Ok(am.insert(db).await?)
}

/// All icons ordered by id. Soft-deleted rows are included.
pub async fn list_views(db: &DatabaseConnection) -> Result<Vec<IconView>, ModelError> {
    let rows = view_select()
        .order_by_asc(Column::Id)
        .into_model::<IconView>()
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn find_view(db: &DatabaseConnection, id: i32) -> Result<Option<IconView>, ModelError> {
    let row = view_select()
        .filter(Column::Id.eq(id))
        .into_model::<IconView>()
        .one(db)
        .await?;
    Ok(row)
}

pub async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}

pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}

/// Persist every column of an existing row.
pub async fn save(db: &DatabaseConnection, icon: Model) -> Result<Model, ModelError> {
    let am: ActiveModel = ActiveModel::from(icon).reset_all();
    Ok(am.update(db).await?)
}
