use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub business_user_id: i32,
    pub reviewer_id: i32,
    pub rating: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

// Both foreign keys point at `users`, so only the reviewed side gets a
// `Related` impl; the reviewer is joined through `Relation::Reviewer` explicitly.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::BusinessUserId",
        to = "super::users::Column::Id"
    )]
    BusinessUser,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReviewerId",
        to = "super::users::Column::Id"
    )]
    Reviewer,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BusinessUser.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
