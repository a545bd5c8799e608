use filtercrate::{FilterError, FilterableEntity, TextOrList};
use sea_orm::{QueryFilter, Select, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub login: String,
    pub role: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl FilterableEntity for Entity {
    fn apply_scope(
        query: Select<Self>,
        scope: &str,
        value: &TextOrList,
    ) -> Result<Select<Self>, FilterError> {
        match scope {
            "with_role" => Ok(query.filter(Column::Role.is_in(value.words()))),
            "login_starts_with" => Ok(query.filter(Column::Login.starts_with(value.joined().trim()))),
            _ => Err(Self::undefined_scope(scope)),
        }
    }
}
