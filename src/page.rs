//! Paginated listings.
//!
//! Every list endpoint takes `{pagination, filters}` and answers with
//! `{status, data, pagination}`. The sort column is a per-resource enum, so a
//! client can only ever order by a column from a fixed set.

use sea_orm::Select;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::prelude::*;

pub const DEFAULT_LIMIT: u64 = 15;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
  #[default]
  #[serde(rename = "ASC", alias = "asc")]
  Asc,
  #[serde(rename = "DESC", alias = "desc")]
  Desc,
}

/// Maps a whitelisted sort key to the column it orders by.
pub trait SortKey<E: EntityTrait>:
  Copy + Default + Serialize + DeserializeOwned
{
  fn column(&self) -> E::Column;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(
  rename_all = "camelCase",
  default,
  bound(deserialize = "S: Deserialize<'de> + Default")
)]
pub struct Pagination<S> {
  pub page: u64,
  pub limit: u64,
  pub order_by: S,
  pub order: Order,
}

impl<S: Default> Default for Pagination<S> {
  fn default() -> Self {
    Self {
      page: 1,
      limit: DEFAULT_LIMIT,
      order_by: S::default(),
      order: Order::default(),
    }
  }
}

impl<S> Pagination<S> {
  fn normalized(self) -> Self {
    Self {
      page: self.page.max(1),
      limit: self.limit.clamp(1, MAX_LIMIT),
      ..self
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(bound(
  deserialize = "S: Deserialize<'de> + Default, F: Deserialize<'de> + Default"
))]
pub struct ListReq<S, F> {
  #[serde(default)]
  pub pagination: Pagination<S>,
  #[serde(default)]
  pub filters: F,
}

#[derive(Debug, Serialize)]
pub struct Page<T, S> {
  pub status: bool,
  pub data: Vec<T>,
  pub pagination: PageInfo<S>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo<S> {
  pub page: u64,
  pub limit: u64,
  pub order_by: S,
  pub order: Order,
  pub total: u64,
}

impl<T, S> Page<T, S> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U, S> {
    Page {
      status: self.status,
      data: self.data.into_iter().map(f).collect(),
      pagination: self.pagination,
    }
  }
}

pub fn ordered<E: EntityTrait>(
  select: Select<E>,
  column: E::Column,
  order: Order,
) -> Select<E> {
  match order {
    Order::Asc => select.order_by_asc(column),
    Order::Desc => select.order_by_desc(column),
  }
}

/// Runs `select` with the requested ordering and returns one page plus the
/// total row count of the same filtered query.
pub async fn fetch<'db, E, S, C>(
  db: &'db C,
  select: Select<E>,
  pagination: Pagination<S>,
) -> Result<Page<E::Model, S>>
where
  C: ConnectionTrait,
  E: EntityTrait,
  E::Model: Sync + 'db,
  S: SortKey<E>,
{
  let pagination = pagination.normalized();
  let select =
    ordered(select, pagination.order_by.column(), pagination.order);

  let paginator = select.paginate(db, pagination.limit);
  let total = paginator.num_items().await?;
  let data = paginator.fetch_page(pagination.page - 1).await?;

  Ok(Page {
    status: true,
    data,
    pagination: PageInfo {
      page: pagination.page,
      limit: pagination.limit,
      order_by: pagination.order_by,
      order: pagination.order,
      total,
    },
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::entity::product;

  #[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
  #[serde(rename_all = "snake_case")]
  enum ProductSort {
    #[default]
    ProductId,
    Price,
  }

  impl SortKey<product::Entity> for ProductSort {
    fn column(&self) -> product::Column {
      match self {
        Self::ProductId => product::Column::ProductId,
        Self::Price => product::Column::Price,
      }
    }
  }

  #[test]
  fn test_pagination_defaults() {
    let req: ListReq<ProductSort, HashMap<String, String>> =
      json::from_str("{}").unwrap();

    assert_eq!(req.pagination.page, 1);
    assert_eq!(req.pagination.limit, DEFAULT_LIMIT);
    assert_eq!(req.pagination.order_by, ProductSort::ProductId);
    assert_eq!(req.pagination.order, Order::Asc);
  }

  #[test]
  fn test_unknown_sort_column_is_rejected() {
    let req = json::from_str::<Pagination<ProductSort>>(
      r#"{"orderBy": "price; DROP TABLE products", "order": "DESC"}"#,
    );
    assert!(req.is_err());

    let req = json::from_str::<Pagination<ProductSort>>(
      r#"{"orderBy": "price", "order": "desc"}"#,
    )
    .unwrap();
    assert_eq!(req.order_by, ProductSort::Price);
    assert_eq!(req.order, Order::Desc);
  }

  #[test]
  fn test_normalized_clamps() {
    let page = Pagination {
      page: 0,
      limit: 10_000,
      ..Pagination::<ProductSort>::default()
    }
    .normalized();
    assert_eq!(page.page, 1);
    assert_eq!(page.limit, MAX_LIMIT);
  }
}
