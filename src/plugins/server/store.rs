use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Path, State},
  routing::{get, post},
};

use super::{Admin, AuthUser, Reply, Routes, done, message, ok};
use crate::{
  entity::product,
  page::{ListReq, Page},
  prelude::*,
  state::AppState,
  sv::{
    order::{NewOrder, OrderFilters, OrderSort, OrderView},
    product::{NewProduct, ProductFilters, ProductSort},
  },
};

pub fn router() -> Routes {
  Router::new()
    .route("/product", post(add_product))
    .route("/products", post(products))
    .route(
      "/product/{id}",
      get(get_product).put(update_product).delete(delete_product),
    )
    .route("/order", post(add_order))
    .route("/orders", post(orders))
}

async fn add_product(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Json(req): Json<NewProduct>,
) -> Result<Json<Reply<product::Model>>> {
  let product = app.sv().product.add(req).await?;
  Ok(done("Product created", product))
}

async fn products(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(mut req): Json<ListReq<ProductSort, ProductFilters>>,
) -> Result<Json<Page<product::Model, ProductSort>>> {
  if !caller.is_admin() {
    req.filters.is_active = Some(true);
  }
  Ok(Json(app.sv().product.list(req).await?))
}

async fn get_product(
  State(app): State<Arc<AppState>>,
  _: AuthUser,
  Path(id): Path<i32>,
) -> Result<Json<Reply<product::Model>>> {
  Ok(ok(app.sv().product.by_id(id).await?))
}

async fn update_product(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
  Json(req): Json<NewProduct>,
) -> Result<Json<Reply<product::Model>>> {
  let product = app.sv().product.update(id, req).await?;
  Ok(done("Product updated", product))
}

async fn delete_product(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<i32>,
) -> Result<Json<Reply<()>>> {
  app.sv().product.delete(id).await?;
  Ok(message("Product deleted"))
}

async fn add_order(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(req): Json<NewOrder>,
) -> Result<Json<Reply<OrderView>>> {
  let order = app.sv().order.add(caller.id(), req).await?;
  Ok(done("Order placed", order))
}

async fn orders(
  State(app): State<Arc<AppState>>,
  caller: AuthUser,
  Json(mut req): Json<ListReq<OrderSort, OrderFilters>>,
) -> Result<Json<Page<OrderView, OrderSort>>> {
  if !caller.is_admin() {
    req.filters.user_id = Some(caller.id());
  }
  Ok(Json(app.sv().order.list(req).await?))
}
