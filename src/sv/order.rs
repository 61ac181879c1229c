use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{order, order_item, product, user},
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

pub const PENDING: &str = "pending";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
  pub product_id: i32,
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  pub items: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order: order::Model,
  pub items: Vec<order_item::Model>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
  OrderId,
  UserId,
  TotalPrice,
  Status,
  #[default]
  CreatedAt,
}

impl SortKey<order::Entity> for OrderSort {
  fn column(&self) -> order::Column {
    match self {
      Self::OrderId => order::Column::OrderId,
      Self::UserId => order::Column::UserId,
      Self::TotalPrice => order::Column::TotalPrice,
      Self::Status => order::Column::Status,
      Self::CreatedAt => order::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilters {
  pub user_id: Option<i32>,
  pub status: Option<String>,
  pub from: Option<DateTime>,
  pub to: Option<DateTime>,
}

pub struct Order<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Order<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Places an order priced from the catalogue. Stock is taken in the same
  /// transaction, so an order either reserves every line or nothing.
  pub async fn add(&self, user_id: i32, req: NewOrder) -> Result<OrderView> {
    if req.items.is_empty() {
      return Err(Error::validation("Order has no items"));
    }
    if let Some(line) = req.items.iter().find(|line| line.quantity <= 0) {
      return Err(Error::validation(format!(
        "Invalid quantity for product {}",
        line.product_id
      )));
    }

    user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("User"))?;

    let txn = self.db.begin().await?;

    let mut priced = Vec::with_capacity(req.items.len());
    let mut total: i64 = 0;
    for line in &req.items {
      let product = product::Entity::find_by_id(line.product_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .filter(|product| product.is_active)
        .ok_or_else(|| {
          Error::validation(format!(
            "Product {} is not available",
            line.product_id
          ))
        })?;

      let taken = product::Entity::update_many()
        .col_expr(
          product::Column::Stock,
          Expr::col(product::Column::Stock).sub(line.quantity),
        )
        .filter(product::Column::ProductId.eq(product.product_id))
        .filter(product::Column::Stock.gte(line.quantity))
        .exec(&txn)
        .await?;
      if taken.rows_affected == 0 {
        return Err(Error::validation(format!(
          "Not enough stock for {}",
          product.name
        )));
      }

      total = product
        .price
        .checked_mul(i64::from(line.quantity))
        .and_then(|amount| total.checked_add(amount))
        .ok_or_else(|| Error::validation("Order total is too large"))?;
      priced.push((line, product.price));
    }

    let order = order::ActiveModel {
      user_id: Set(user_id),
      total_price: Set(total),
      status: Set(PENDING.to_string()),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (line, price) in priced {
      let item = order_item::ActiveModel {
        order_id: Set(order.order_id),
        product_id: Set(line.product_id),
        quantity: Set(line.quantity),
        price: Set(price),
        ..Default::default()
      }
      .insert(&txn)
      .await?;
      items.push(item);
    }

    txn.commit().await?;

    info!("Order {} placed by user {user_id}", order.order_id);
    Ok(OrderView { order, items })
  }

  pub async fn list(
    &self,
    req: ListReq<OrderSort, OrderFilters>,
  ) -> Result<Page<OrderView, OrderSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = order::Entity::find();
    if let Some(user_id) = filters.user_id {
      query = query.filter(order::Column::UserId.eq(user_id));
    }
    if let Some(status) = filters.status.as_deref()
      && !utils::is_blank(Some(status))
    {
      query = query.filter(order::Column::Status.eq(status.trim()));
    }
    if let Some(from) = filters.from {
      query = query.filter(order::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filters.to {
      query = query.filter(order::Column::CreatedAt.lte(to));
    }

    let page = page::fetch(self.db, query, pagination).await?;

    let ids: Vec<i32> = page.data.iter().map(|order| order.order_id).collect();
    let mut items: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in order_item::Entity::find()
      .filter(order_item::Column::OrderId.is_in(ids))
      .order_by_asc(order_item::Column::OrderItemId)
      .all(self.db)
      .await?
    {
      items.entry(item.order_id).or_default().push(item);
    }

    Ok(page.map(|order| OrderView {
      items: items.remove(&order.order_id).unwrap_or_default(),
      order,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{Product, product::NewProduct, testing};

  async fn product(db: &DatabaseConnection, price: i64, stock: i32) -> i32 {
    Product::new(db)
      .add(NewProduct {
        name: format!("Item {price}"),
        description: None,
        price,
        stock,
        is_active: true,
      })
      .await
      .unwrap()
      .product_id
  }

  fn line(product_id: i32, quantity: i32) -> OrderLine {
    OrderLine { product_id, quantity }
  }

  #[tokio::test]
  async fn test_total_from_catalogue() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "ana@club.pt").await;
    let balls = product(&db, 599, 10).await;
    let grip = product(&db, 350, 10).await;

    let sv = Order::new(&db);
    let view = sv
      .add(
        user.user_id,
        NewOrder { items: vec![line(balls, 3), line(grip, 1)] },
      )
      .await
      .unwrap();

    assert_eq!(view.order.total_price, 3 * 599 + 350);
    assert_eq!(view.order.status, PENDING);
    assert_eq!(view.items.len(), 2);

    let stock = Product::new(&db).by_id(balls).await.unwrap().stock;
    assert_eq!(stock, 7);
  }

  #[tokio::test]
  async fn test_rejected_order_takes_nothing() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "ana@club.pt").await;
    let balls = product(&db, 599, 10).await;
    let grip = product(&db, 350, 1).await;

    let sv = Order::new(&db);
    let res = sv
      .add(
        user.user_id,
        NewOrder { items: vec![line(balls, 2), line(grip, 2)] },
      )
      .await;
    assert!(matches!(res, Err(Error::Validation(_))));

    let res =
      sv.add(user.user_id, NewOrder { items: vec![line(404, 1)] }).await;
    assert!(matches!(res, Err(Error::Validation(_))));

    assert_eq!(Product::new(&db).by_id(balls).await.unwrap().stock, 10);
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_total_overflow_is_refused() {
    let db = testing::setup_db().await;
    let user = testing::user(&db, "ana@club.pt").await;
    let racket = product(&db, i64::MAX / 2, 10).await;

    let res = Order::new(&db)
      .add(user.user_id, NewOrder { items: vec![line(racket, 3)] })
      .await;
    assert!(matches!(res, Err(Error::Validation(_))));

    assert_eq!(Product::new(&db).by_id(racket).await.unwrap().stock, 10);
    assert_eq!(order::Entity::find().count(&db).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_list_with_items() {
    let db = testing::setup_db().await;
    let ana = testing::user(&db, "ana@club.pt").await;
    let rui = testing::user(&db, "rui@club.pt").await;
    let balls = product(&db, 599, 10).await;

    let sv = Order::new(&db);
    for user in [&ana, &rui, &ana] {
      sv.add(user.user_id, NewOrder { items: vec![line(balls, 1)] })
        .await
        .unwrap();
    }

    let req = ListReq {
      pagination: Default::default(),
      filters: OrderFilters {
        user_id: Some(ana.user_id),
        ..Default::default()
      },
    };
    let page = sv.list(req).await.unwrap();

    assert_eq!(page.pagination.total, 2);
    assert!(page.data.iter().all(|view| view.items.len() == 1));
  }
}
