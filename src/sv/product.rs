use serde::{Deserialize, Serialize};

use crate::{
  entity::product,
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  /// Cents
  pub price: i64,
  #[serde(default)]
  pub stock: i32,
  #[serde(default = "active")]
  pub is_active: bool,
}

fn active() -> bool {
  true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
  #[default]
  ProductId,
  Name,
  Price,
  Stock,
  CreatedAt,
}

impl SortKey<product::Entity> for ProductSort {
  fn column(&self) -> product::Column {
    match self {
      Self::ProductId => product::Column::ProductId,
      Self::Name => product::Column::Name,
      Self::Price => product::Column::Price,
      Self::Stock => product::Column::Stock,
      Self::CreatedAt => product::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
  pub name: Option<String>,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  pub is_active: Option<bool>,
}

fn check(req: &NewProduct) -> Result<()> {
  if utils::is_blank(Some(&req.name)) {
    return Err(Error::validation("Product name is required"));
  }
  if req.price < 0 {
    return Err(Error::validation("Price cannot be negative"));
  }
  if req.stock < 0 {
    return Err(Error::validation("Stock cannot be negative"));
  }
  Ok(())
}

pub struct Product<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Product<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn add(&self, req: NewProduct) -> Result<product::Model> {
    check(&req)?;

    let product = product::ActiveModel {
      name: Set(req.name.trim().to_string()),
      description: Set(req.description),
      price: Set(req.price),
      is_active: Set(req.is_active),
      stock: Set(req.stock),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    Ok(product)
  }

  pub async fn by_id(&self, product_id: i32) -> Result<product::Model> {
    product::Entity::find_by_id(product_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Product"))
  }

  pub async fn update(
    &self,
    product_id: i32,
    req: NewProduct,
  ) -> Result<product::Model> {
    check(&req)?;
    let product = self.by_id(product_id).await?;

    let product = product::ActiveModel {
      name: Set(req.name.trim().to_string()),
      description: Set(req.description),
      price: Set(req.price),
      is_active: Set(req.is_active),
      stock: Set(req.stock),
      ..product.into()
    }
    .update(self.db)
    .await?;

    Ok(product)
  }

  pub async fn delete(&self, product_id: i32) -> Result<()> {
    let res = product::Entity::delete_by_id(product_id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::NotFound("Product"));
    }
    Ok(())
  }

  pub async fn list(
    &self,
    req: ListReq<ProductSort, ProductFilters>,
  ) -> Result<Page<product::Model, ProductSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = product::Entity::find();
    if let Some(name) = filters.name.as_deref()
      && !utils::is_blank(Some(name))
    {
      query = query.filter(product::Column::Name.like(utils::like(name)));
    }
    if let Some(min) = filters.min_price {
      query = query.filter(product::Column::Price.gte(min));
    }
    if let Some(max) = filters.max_price {
      query = query.filter(product::Column::Price.lte(max));
    }
    if let Some(is_active) = filters.is_active {
      query = query.filter(product::Column::IsActive.eq(is_active));
    }

    page::fetch(self.db, query, pagination).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{page::Order, sv::testing};

  fn racket(name: &str, price: i64) -> NewProduct {
    NewProduct {
      name: name.to_string(),
      description: None,
      price,
      stock: 5,
      is_active: true,
    }
  }

  #[tokio::test]
  async fn test_crud() {
    let db = testing::setup_db().await;
    let sv = Product::new(&db);

    let product = sv.add(racket("Bullpadel Vertex", 24_990)).await.unwrap();
    let product =
      sv.update(product.product_id, racket("Bullpadel Vertex 04", 22_990))
        .await
        .unwrap();
    assert_eq!(product.price, 22_990);

    assert!(matches!(
      sv.add(racket("Bolas", -1)).await,
      Err(Error::Validation(_))
    ));

    sv.delete(product.product_id).await.unwrap();
    assert!(matches!(
      sv.by_id(product.product_id).await,
      Err(Error::NotFound("Product"))
    ));
  }

  #[tokio::test]
  async fn test_list_price_range_sorted() {
    let db = testing::setup_db().await;
    let sv = Product::new(&db);

    for (name, price) in [("Bolas", 599), ("Grip", 350), ("Raquete", 9_990)] {
      sv.add(racket(name, price)).await.unwrap();
    }

    let mut req: ListReq<ProductSort, ProductFilters> = ListReq {
      pagination: Default::default(),
      filters: ProductFilters { max_price: Some(1_000), ..Default::default() },
    };
    req.pagination.order_by = ProductSort::Price;
    req.pagination.order = Order::Desc;

    let page = sv.list(req).await.unwrap();
    assert_eq!(page.pagination.total, 2);
    let names: Vec<_> = page.data.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Bolas", "Grip"]);
  }
}
