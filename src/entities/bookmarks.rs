use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bookmark")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Creation time, RFC 3339 UTC with fixed precision so it sorts lexically
    pub date: String,

    pub url: String,

    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tag_bookmarks::Entity")]
    TagBookmarks,
}

impl Related<super::tag_bookmarks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TagBookmarks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
