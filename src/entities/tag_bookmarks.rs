use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tag_bookmark")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "tag")]
    pub tag_id: i32,
    #[sea_orm(primary_key, auto_increment = false, column_name = "bookmark")]
    pub bookmark_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tags::Entity",
        from = "Column::TagId",
        to = "super::tags::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Tag,
    #[sea_orm(
        belongs_to = "super::bookmarks::Entity",
        from = "Column::BookmarkId",
        to = "super::bookmarks::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Bookmark,
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl Related<super::bookmarks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookmark.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
