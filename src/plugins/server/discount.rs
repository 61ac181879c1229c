//! Routes for both discount card kinds.

macro_rules! discount_routes {
  ($module:ident, $entity:ident, $path:literal) => {
    pub mod $module {
      use std::sync::Arc;

      use axum::{
        Json, Router,
        extract::{Path, State},
        routing::{get, post},
      };

      use super::super::{
        Admin, AuthUser, BatchReply, Reply, Routes, done, message, ok,
      };
      use crate::{
        entity::$entity as card,
        page::{ListReq, Page},
        prelude::*,
        state::AppState,
        sv::discount::{
          AssignCards, DiscountFilters, DiscountSort, NewDiscountCard,
        },
      };

      pub fn router() -> Routes {
        Router::new()
          .route(concat!("/", $path), post(add))
          .route(concat!("/", $path, "s"), post(list))
          .route(
            concat!("/", $path, "/{id}"),
            get(by_id).put(update).delete(delete),
          )
          .route(concat!("/", $path, "/assign"), post(assign))
      }

      async fn add(
        State(app): State<Arc<AppState>>,
        _: Admin,
        Json(req): Json<NewDiscountCard>,
      ) -> Result<Json<Reply<card::Model>>> {
        let card = app.sv().$module.add(req).await?;
        Ok(done("Card created", card))
      }

      async fn list(
        State(app): State<Arc<AppState>>,
        _: AuthUser,
        Json(req): Json<ListReq<DiscountSort, DiscountFilters>>,
      ) -> Result<Json<Page<card::Model, DiscountSort>>> {
        Ok(Json(app.sv().$module.list(req).await?))
      }

      async fn by_id(
        State(app): State<Arc<AppState>>,
        _: AuthUser,
        Path(id): Path<i32>,
      ) -> Result<Json<Reply<card::Model>>> {
        Ok(ok(app.sv().$module.by_id(id).await?))
      }

      async fn update(
        State(app): State<Arc<AppState>>,
        _: Admin,
        Path(id): Path<i32>,
        Json(req): Json<NewDiscountCard>,
      ) -> Result<Json<Reply<card::Model>>> {
        let card = app.sv().$module.update(id, req).await?;
        Ok(done("Card updated", card))
      }

      async fn delete(
        State(app): State<Arc<AppState>>,
        _: Admin,
        Path(id): Path<i32>,
      ) -> Result<Json<Reply<()>>> {
        app.sv().$module.delete(id).await?;
        Ok(message("Card deleted"))
      }

      async fn assign(
        State(app): State<Arc<AppState>>,
        admin: Admin,
        Json(req): Json<AssignCards>,
      ) -> Result<Json<BatchReply>> {
        let result = app.sv().$module.assign(req, admin.id()).await?;
        Ok(BatchReply::new(result, "Cards assigned", "Nothing to assign"))
      }
    }
  };
}

discount_routes!(offpeak, offpeak_card, "offpeak-card");
discount_routes!(offpick, offpick_card, "offpick-card");
