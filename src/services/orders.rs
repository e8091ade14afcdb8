use crate::{
    db::DbPool,
    entities::{
        order::{self, OrderStatus},
        product,
    },
    errors::ServiceError,
};
use chrono::{SecondsFormat, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

const NOT_FOUND: &str = "Order not found";
const INVALID_STATUS: &str = "Valid status is required";

/// Column header of the CSV export.
pub const CSV_HEADER: [&str; 10] = [
    "Order ID",
    "Customer Name",
    "Company",
    "City",
    "Phone",
    "Email",
    "Product",
    "Price",
    "Status",
    "Date",
];

/// Order with the ordered product embedded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(flatten)]
    pub order: order::Model,
    pub product: Option<product::Model>,
}

impl From<(order::Model, Option<product::Model>)> for OrderView {
    fn from((order, product): (order::Model, Option<product::Model>)) -> Self {
        Self { order, product }
    }
}

/// Customer details for a new order, already validated.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub name: String,
    pub company_name: Option<String>,
    pub city: String,
    pub phone: String,
    pub email: String,
    pub product_id: Uuid,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: String,
    name: &'a str,
    company: &'a str,
    city: &'a str,
    phone: &'a str,
    email: &'a str,
    product: &'a str,
    price: String,
    status: String,
    date: String,
}

/// Reads a status from client input; only the five upper-case names are valid.
pub fn parse_status(raw: Option<&str>) -> Result<OrderStatus, ServiceError> {
    raw.map(str::trim)
        .and_then(|s| OrderStatus::from_str(s).ok())
        .ok_or_else(|| ServiceError::InvalidStatus(INVALID_STATUS.to_string()))
}

/// RFC 4180 CSV of `orders`, header first.
pub fn orders_to_csv(orders: &[OrderView]) -> Result<String, ServiceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for view in orders {
        let order = &view.order;
        writer.serialize(CsvRow {
            id: order.id.to_string(),
            name: &order.name,
            company: order.company_name.as_deref().unwrap_or(""),
            city: &order.city,
            phone: &order.phone,
            email: &order.email,
            product: view.product.as_ref().map_or("", |p| p.name.as_str()),
            price: view
                .product
                .as_ref()
                .map(|p| p.price.to_string())
                .unwrap_or_default(),
            status: order.status.to_string(),
            date: order.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::SerializationError(e.to_string()))
}

/// Service for customer orders
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Places an order in `PENDING`.
    #[instrument(skip(self, draft), fields(product_id = %draft.product_id))]
    pub async fn create(&self, draft: OrderDraft) -> Result<OrderView, ServiceError> {
        let db = self.db_pool.as_ref();
        let product = product::Entity::find_by_id(draft.product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::BadRequest("Product does not exist".to_string()))?;

        let now = Utc::now();
        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(draft.name),
            company_name: Set(draft.company_name),
            city: Set(draft.city),
            phone: Set(draft.phone),
            email: Set(draft.email),
            product_id: Set(product.id),
            status: Set(OrderStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(db).await?;
        info!(order_id = %created.id, "order placed");
        Ok(OrderView::from((created, Some(product))))
    }

    /// All orders, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<OrderView>, ServiceError> {
        let orders = order::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(orders.into_iter().map(OrderView::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<OrderView, ServiceError> {
        order::Entity::find_by_id(id)
            .find_also_related(product::Entity)
            .one(self.db_pool.as_ref())
            .await?
            .map(OrderView::from)
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND.to_string()))
    }

    /// Moves an order along its lifecycle. Re-applying the current status
    /// changes nothing.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let db = self.db_pool.as_ref();
        let current = self.get(id).await?;
        let from = current.order.status;

        if from == next {
            return Ok(current);
        }
        if !from.can_transition_to(next) {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change order status from {} to {}",
                from, next
            )));
        }

        let OrderView { order, product } = current;
        let mut active: order::ActiveModel = order.into();
        active.status = Set(next);
        active.updated_at = Set(Utc::now());
        let updated = active.update(db).await?;

        info!(order_id = %id, %from, to = %next, "order status changed");
        Ok(OrderView::from((updated, product)))
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = order::Entity::delete_by_id(id)
            .exec(self.db_pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(NOT_FOUND.to_string()));
        }
        info!(order_id = %id, "order deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ProductSpecs, StringList};
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn view(name: &str, company: Option<&str>, product_name: &str) -> OrderView {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let product_id = Uuid::nil();
        OrderView {
            order: order::Model {
                id: Uuid::nil(),
                name: name.into(),
                company_name: company.map(Into::into),
                city: "Paris".into(),
                phone: "+33 1 23 45 67 89".into(),
                email: "client@example.com".into(),
                product_id,
                status: OrderStatus::Confirmed,
                created_at: at,
                updated_at: at,
            },
            product: Some(product::Model {
                id: product_id,
                name: product_name.into(),
                description: String::new(),
                price: 1299.5,
                image_url: None,
                category_id: Uuid::nil(),
                specs: ProductSpecs::default(),
                features: StringList::default(),
                rating: None,
                created_at: at,
                updated_at: at,
            }),
        }
    }

    #[test]
    fn csv_has_header_even_when_empty() {
        let csv = orders_to_csv(&[]).unwrap();
        assert_eq!(
            csv,
            "Order ID,Customer Name,Company,City,Phone,Email,Product,Price,Status,Date\n"
        );
    }

    #[test]
    fn csv_quotes_fields_with_commas_and_quotes() {
        let csv = orders_to_csv(&[view(
            "Doe, Jane",
            Some("ACME \"Best\" Ltd"),
            "Laptop 14\", 16GB",
        )])
        .unwrap();

        let mut lines = csv.lines();
        lines.next();
        let row = lines.next().unwrap();
        assert_eq!(
            row,
            "00000000-0000-0000-0000-000000000000,\"Doe, Jane\",\"ACME \"\"Best\"\" Ltd\",Paris,+33 1 23 45 67 89,client@example.com,\"Laptop 14\"\", 16GB\",1299.5,CONFIRMED,2024-05-01T09:30:00.000Z"
        );

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "Doe, Jane");
        assert_eq!(&record[6], "Laptop 14\", 16GB");
    }

    #[test]
    fn csv_blank_company_is_empty_cell() {
        let csv = orders_to_csv(&[view("Jane", None, "Mouse")]).unwrap();
        assert!(csv.lines().nth(1).unwrap().contains(",Jane,,Paris,"));
    }

    #[test]
    fn status_parsing_accepts_exact_names_only() {
        assert_eq!(parse_status(Some("SHIPPED")).unwrap(), OrderStatus::Shipped);
        assert_eq!(parse_status(Some(" PENDING ")).unwrap(), OrderStatus::Pending);
        for bad in [None, Some(""), Some("shipped"), Some("LOST")] {
            assert_matches!(
                parse_status(bad),
                Err(ServiceError::InvalidStatus(msg)) if msg == INVALID_STATUS
            );
        }
    }
}
