use sea_orm::entity::prelude::*;

/// A catalog entry. `avg_rating` is a cached aggregate kept in sync by the
/// rating upsert; the like count is never stored and is always counted from
/// `like` rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title_fr: String,
    pub title_original: String,
    pub origin_country: String,
    pub duration_minutes: Option<i32>,
    pub director: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// `YYYY-MM-DD`
    pub release_date: Option<String>,
    pub poster: Option<String>,
    pub illustration: Option<String>,
    #[sea_orm(column_type = "Double", nullable)]
    pub avg_rating: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::casting::Entity")]
    Casting,
    #[sea_orm(has_many = "super::like::Entity")]
    Like,
    #[sea_orm(has_many = "super::rating::Entity")]
    Rating,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::casting::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Casting.def()
    }
}

impl Related<super::like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rating.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        super::casting::Relation::Actor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::casting::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
