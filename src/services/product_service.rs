use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::products::ProductList,
    entity::{
        product_groups::{Column as GroupCol, Entity as ProductGroups, Model as GroupModel},
        products::{Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Product, VariantGroup},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::SellingPrice.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::SellingPrice.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::SellingPrice,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let mut groups = load_groups(&state.orm, &ids).await?;

    let items = models
        .into_iter()
        .map(|model| {
            let grps = groups.remove(&model.id).unwrap_or_default();
            product_from_entity(model, grps)
        })
        .collect();

    let meta = Meta {
        page,
        per_page: limit,
        total,
    };
    let data = ProductList { items };
    Ok(ApiResponse::paginated("Products", data, meta))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = load_product(&state.orm, id).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::new("Product", product))
}

/// Load one product with its variant groups resolved.
pub async fn load_product(orm: &OrmConn, id: Uuid) -> AppResult<Option<Product>> {
    let Some(model) = Products::find_by_id(id).one(orm).await? else {
        return Ok(None);
    };

    let groups = ProductGroups::find()
        .filter(GroupCol::ProductId.eq(id))
        .all(orm)
        .await?;

    Ok(Some(product_from_entity(model, groups)))
}

/// Load a batch of products keyed by id, each with its groups.
pub async fn load_products(orm: &OrmConn, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = Products::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(orm)
        .await?;

    let mut groups = load_groups(orm, ids).await?;

    Ok(models
        .into_iter()
        .map(|model| {
            let grps = groups.remove(&model.id).unwrap_or_default();
            (model.id, product_from_entity(model, grps))
        })
        .collect())
}

async fn load_groups(
    orm: &OrmConn,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<GroupModel>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = ProductGroups::find()
        .filter(GroupCol::ProductId.is_in(product_ids.iter().copied()))
        .all(orm)
        .await?;

    let mut by_product: HashMap<Uuid, Vec<GroupModel>> = HashMap::new();
    for row in rows {
        by_product.entry(row.product_id).or_default().push(row);
    }
    Ok(by_product)
}

pub fn product_from_entity(model: ProductModel, groups: Vec<GroupModel>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        category: model.category,
        brand: model.brand,
        description: model.description,
        selling_price: model.selling_price,
        discount: model.discount,
        quantity: model.quantity,
        groups: groups.into_iter().map(group_from_entity).collect(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn group_from_entity(model: GroupModel) -> VariantGroup {
    VariantGroup {
        id: model.id,
        color: model.color,
        size: model.size,
        material: model.material,
        price: model.price,
        quantity: model.quantity,
    }
}
