use sea_orm::{ActiveValue, entity::prelude::*};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "actor")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub birth_date: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub biography: String,
    pub photo: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::casting::Entity")]
    Casting,
}

impl Related<super::casting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Casting.def()
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::casting::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::casting::Relation::Actor.def().rev())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Fills a blank `full_name` from the first and last names.
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if text(&self.full_name).trim().is_empty() {
            let full_name =
                derive_full_name(text(&self.first_name).trim(), text(&self.last_name).trim());
            self.full_name = ActiveValue::Set(full_name);
        }
        Ok(self)
    }
}

fn text(value: &ActiveValue<String>) -> &str {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => v,
        ActiveValue::NotSet => "",
    }
}

/// "First Last", or just the last name when there is no first name.
pub fn derive_full_name(first_name: &str, last_name: &str) -> String {
    if first_name.is_empty() {
        last_name.to_string()
    } else {
        format!("{first_name} {last_name}")
    }
}
