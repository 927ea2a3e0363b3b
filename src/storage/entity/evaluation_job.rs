use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "evaluation_jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub status: String, // pending/running/completed/failed
    pub dataset_info: String,
    pub model_info: String,
    #[sea_orm(nullable)]
    pub results: Option<String>,
    #[sea_orm(nullable)]
    pub report_html: Option<String>,
    #[sea_orm(nullable)]
    pub summary_text: Option<String>,
    #[sea_orm(nullable)]
    pub error_message: Option<String>,
    // 微秒时间戳
    pub created_at: i64,
    pub updated_at: i64,
    #[sea_orm(nullable)]
    pub completed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
