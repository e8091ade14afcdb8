use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of a customer order.
///
/// ```text
/// PENDING ──> CONFIRMED ──> SHIPPED ──> DELIVERED
///    │            │            │
///    └────────────┴────────────┴──────> CANCELLED
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// States reachable in one step.
    pub fn next_states(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered | Cancelled => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next_states().is_empty()
    }

    /// Staying in the same state is always allowed.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self == next || self.next_states().contains(&next)
    }
}

/// Customer order for a single product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
#[schema(as = Order)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Customer name
    pub name: String,
    pub company_name: Option<String>,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub product_id: Uuid,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::{self, *};
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Pending, Confirmed, true)]
    #[case(Pending, Cancelled, true)]
    #[case(Pending, Shipped, false)]
    #[case(Pending, Delivered, false)]
    #[case(Confirmed, Shipped, true)]
    #[case(Confirmed, Pending, false)]
    #[case(Shipped, Delivered, true)]
    #[case(Shipped, Cancelled, true)]
    #[case(Delivered, Cancelled, false)]
    #[case(Cancelled, Pending, false)]
    #[case(Delivered, Delivered, true)]
    fn transition_table(#[case] from: OrderStatus, #[case] to: OrderStatus, #[case] ok: bool) {
        assert_eq!(from.can_transition_to(to), ok);
    }

    #[test]
    fn terminal_states() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Shipped.is_terminal());
    }

    #[test]
    fn wire_names_are_upper_case() {
        assert_eq!(OrderStatus::from_str("SHIPPED").unwrap(), Shipped);
        assert!(OrderStatus::from_str("shipped").is_err());
        assert_eq!(Confirmed.to_string(), "CONFIRMED");
        assert_eq!(serde_json::to_value(Cancelled).unwrap(), "CANCELLED");
    }

    #[test]
    fn new_orders_start_pending() {
        assert_eq!(OrderStatus::default(), Pending);
    }
}
