use serde::{Deserialize, Serialize};

use crate::{
  entity::article,
  page::{self, ListReq, Page, SortKey},
  prelude::*,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
  pub title: String,
  pub content: String,
  pub author: Option<String>,
  pub image_url: Option<String>,
  #[serde(default = "active")]
  pub is_active: bool,
}

fn active() -> bool {
  true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSort {
  ArticleId,
  Title,
  #[default]
  CreatedAt,
}

impl SortKey<article::Entity> for ArticleSort {
  fn column(&self) -> article::Column {
    match self {
      Self::ArticleId => article::Column::ArticleId,
      Self::Title => article::Column::Title,
      Self::CreatedAt => article::Column::CreatedAt,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleFilters {
  pub title: Option<String>,
  pub author: Option<String>,
  pub is_active: Option<bool>,
}

pub struct Article<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Article<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn add(&self, req: NewArticle) -> Result<article::Model> {
    if utils::is_blank(Some(&req.title)) {
      return Err(Error::validation("Article title is required"));
    }

    let article = article::ActiveModel {
      title: Set(req.title.trim().to_string()),
      content: Set(req.content),
      author: Set(req.author),
      image_url: Set(req.image_url),
      is_active: Set(req.is_active),
      created_at: Set(utils::now()),
      ..Default::default()
    }
    .insert(self.db)
    .await?;

    Ok(article)
  }

  pub async fn by_id(&self, article_id: i32) -> Result<article::Model> {
    article::Entity::find_by_id(article_id)
      .one(self.db)
      .await?
      .ok_or(Error::NotFound("Article"))
  }

  pub async fn update(
    &self,
    article_id: i32,
    req: NewArticle,
  ) -> Result<article::Model> {
    if utils::is_blank(Some(&req.title)) {
      return Err(Error::validation("Article title is required"));
    }

    let article = self.by_id(article_id).await?;
    let article = article::ActiveModel {
      title: Set(req.title.trim().to_string()),
      content: Set(req.content),
      author: Set(req.author),
      image_url: Set(req.image_url),
      is_active: Set(req.is_active),
      ..article.into()
    }
    .update(self.db)
    .await?;

    Ok(article)
  }

  pub async fn delete(&self, article_id: i32) -> Result<()> {
    let res = article::Entity::delete_by_id(article_id).exec(self.db).await?;
    if res.rows_affected == 0 {
      return Err(Error::NotFound("Article"));
    }
    Ok(())
  }

  pub async fn list(
    &self,
    req: ListReq<ArticleSort, ArticleFilters>,
  ) -> Result<Page<article::Model, ArticleSort>> {
    let ListReq { pagination, filters } = req;

    let mut query = article::Entity::find();
    if let Some(title) = filters.title.as_deref()
      && !utils::is_blank(Some(title))
    {
      query = query.filter(article::Column::Title.like(utils::like(title)));
    }
    if let Some(author) = filters.author.as_deref()
      && !utils::is_blank(Some(author))
    {
      query = query.filter(article::Column::Author.like(utils::like(author)));
    }
    if let Some(is_active) = filters.is_active {
      query = query.filter(article::Column::IsActive.eq(is_active));
    }

    page::fetch(self.db, query, pagination).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing;

  fn news(title: &str, author: &str) -> NewArticle {
    NewArticle {
      title: title.to_string(),
      content: String::from("..."),
      author: Some(author.to_string()),
      image_url: None,
      is_active: true,
    }
  }

  #[tokio::test]
  async fn test_pagination_total_matches_filters() {
    let db = testing::setup_db().await;
    let sv = Article::new(&db);

    for i in 0..5 {
      sv.add(news(&format!("Torneio {i}"), "Rita")).await.unwrap();
    }
    sv.add(news("Nova liga", "Miguel")).await.unwrap();

    let mut req: ListReq<ArticleSort, ArticleFilters> = ListReq {
      pagination: Default::default(),
      filters: ArticleFilters {
        author: Some(String::from("rita")),
        ..Default::default()
      },
    };
    req.pagination.limit = 2;
    req.pagination.page = 3;

    let page = sv.list(req).await.unwrap();
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.data.len(), 1);
  }

  #[tokio::test]
  async fn test_update_and_delete() {
    let db = testing::setup_db().await;
    let sv = Article::new(&db);

    let article = sv.add(news("Torneio", "Rita")).await.unwrap();
    let article =
      sv.update(article.article_id, news("Torneio de Natal", "Rita")).await;
    let article = article.unwrap();
    assert_eq!(article.title, "Torneio de Natal");

    assert!(matches!(
      sv.update(article.article_id, news(" ", "Rita")).await,
      Err(Error::Validation(_))
    ));

    sv.delete(article.article_id).await.unwrap();
    assert!(matches!(
      sv.delete(article.article_id).await,
      Err(Error::NotFound("Article"))
    ));
  }
}
