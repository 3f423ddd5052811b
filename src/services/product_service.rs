use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::products::{ProductDetail, ProductInput, ProductList},
    entity::{
        attributes::Entity as Attributes,
        brands::{Column as BrandCol, Entity as Brands, Model as BrandModel},
        categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        price_enquiries::{Column as EnqCol, Entity as Enquiries},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Attribute, DisplayContext, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{
        catalog_service::{category_links, descendant_ids},
        display_context, non_empty, resolve_slug,
    },
    state::AppState,
};

const RELATED_LIMIT: u64 = 4;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    search_products(state, query, false).await
}

pub async fn admin_list_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    search_products(state, query, true).await
}

async fn search_products(
    state: &AppState,
    query: ProductQuery,
    include_inactive: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let empty = || {
        ApiResponse::success(
            "Products",
            ProductList { items: Vec::new() },
            Some(Meta::new(page, limit, 0)),
        )
    };

    let mut condition = Condition::all();
    if !include_inactive {
        condition = condition.add(ProdCol::IsActive.eq(true));
    }

    if let Some(q) = non_empty(query.q.clone()) {
        let pattern = format!("%{}%", escape_like(&q.to_lowercase()));
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(ProdCol::Name))).like(pattern.clone()))
                .add(Expr::expr(Func::lower(Expr::col(ProdCol::Description))).like(pattern)),
        );
    }

    if let Some(key) = non_empty(query.brand.clone()) {
        match find_brand(&state.orm, &key).await? {
            Some(brand) => condition = condition.add(ProdCol::BrandId.eq(brand.id)),
            None => return Ok(empty()),
        }
    }

    if let Some(key) = non_empty(query.category.clone()) {
        match find_category(&state.orm, &key).await? {
            Some(category) => {
                let links = category_links(&state.orm).await?;
                condition =
                    condition.add(ProdCol::CategoryId.is_in(descendant_ids(&links, category.id)));
            }
            None => return Ok(empty()),
        }
    }

    if let Some(min) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max));
    }
    match query.in_stock {
        Some(true) => condition = condition.add(ProdCol::Stock.gt(0)),
        Some(false) => condition = condition.add(ProdCol::Stock.eq(0)),
        None => {}
    }
    if let Some(b2b) = query.b2b {
        condition = condition.add(ProdCol::IsB2b.eq(b2b));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let default_order = match sort_by {
        ProductSortBy::CreatedAt => SortOrder::Desc,
        ProductSortBy::Price | ProductSortBy::Name => SortOrder::Asc,
    };
    let order = match query.sort_order.unwrap_or(default_order) {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    };
    let column = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Name => ProdCol::Name,
    };

    let finder = Products::find()
        .filter(condition)
        .order_by(column, order)
        .order_by_asc(ProdCol::Id);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = hydrate_products(&state.orm, &display_context(state), models).await?;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, key: &str) -> AppResult<ApiResponse<ProductDetail>> {
    let by_key = match Uuid::parse_str(key) {
        Ok(id) => ProdCol::Id.eq(id),
        Err(_) => ProdCol::Slug.eq(key),
    };
    let product = Products::find()
        .filter(by_key)
        .filter(ProdCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let related = match product.category_id {
        Some(category_id) => {
            Products::find()
                .filter(ProdCol::CategoryId.eq(category_id))
                .filter(ProdCol::IsActive.eq(true))
                .filter(ProdCol::Id.ne(product.id))
                .order_by_desc(ProdCol::CreatedAt)
                .limit(RELATED_LIMIT)
                .all(&state.orm)
                .await?
        }
        None => Vec::new(),
    };

    let ctx = display_context(state);
    let mut hydrated = hydrate_products(&state.orm, &ctx, vec![product]).await?;
    let product = hydrated.pop().ok_or(AppError::NotFound)?;
    let related = hydrate_products(&state.orm, &ctx, related).await?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail { product, related },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductInput,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    check_product_input(state, &payload).await?;

    let slug = resolve_slug::<Products, _>(
        &state.orm,
        ProdCol::Slug,
        ProdCol::Id,
        &payload.name,
        payload.slug.as_deref(),
        None,
    )
    .await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(non_empty(payload.description)),
        price: Set(payload.price),
        mrp: Set(payload.mrp),
        stock: Set(payload.stock),
        brand_id: Set(payload.brand_id),
        category_id: Set(payload.category_id),
        image_url: Set(non_empty(payload.image_url)),
        gallery: Set(serde_json::json!(payload.gallery)),
        attributes: Set(serde_json::json!(payload.attributes)),
        is_b2b: Set(payload.is_b2b),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;

    let product = hydrate_one(state, product).await?;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductInput,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    check_product_input(state, &payload).await?;

    let slug = if payload.slug.is_none() && existing.name == payload.name.trim() {
        existing.slug.clone()
    } else {
        resolve_slug::<Products, _>(
            &state.orm,
            ProdCol::Slug,
            ProdCol::Id,
            &payload.name,
            payload.slug.as_deref(),
            Some(id),
        )
        .await?
    };

    let mut active: ProductActive = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(slug);
    active.description = Set(non_empty(payload.description));
    active.price = Set(payload.price);
    active.mrp = Set(payload.mrp);
    active.stock = Set(payload.stock);
    active.brand_id = Set(payload.brand_id);
    active.category_id = Set(payload.category_id);
    active.image_url = Set(non_empty(payload.image_url));
    active.gallery = Set(serde_json::json!(payload.gallery));
    active.attributes = Set(serde_json::json!(payload.attributes));
    active.is_b2b = Set(payload.is_b2b);
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = hydrate_one(state, product).await?;
    Ok(ApiResponse::success("Product updated", product, Some(Meta::empty())))
}

/// Products referenced by past orders or price enquiries are deactivated
/// instead of removed.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?
        > 0;
    let enquired = Enquiries::find()
        .filter(EnqCol::ProductId.eq(id))
        .count(&state.orm)
        .await?
        > 0;
    let archived = ordered || enquired;

    let message = if archived {
        let mut active: ProductActive = existing.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().into());
        active.update(&state.orm).await?;
        "Product archived"
    } else {
        Products::delete_by_id(id).exec(&state.orm).await?;
        "Product deleted"
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id, "archived": archived }),
    )
    .await;

    Ok(ApiResponse::success(
        message,
        serde_json::json!({ "id": id, "archived": archived }),
        Some(Meta::empty()),
    ))
}

async fn check_product_input(state: &AppState, payload: &ProductInput) -> AppResult<()> {
    let mut errors = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => err.into(),
    };

    if payload.mrp.is_some_and(|mrp| mrp > 0 && mrp < payload.price) {
        errors.add("mrp", "must not be below the price");
    }
    if let Some(brand_id) = payload.brand_id {
        if Brands::find_by_id(brand_id).one(&state.orm).await?.is_none() {
            errors.add("brand_id", "brand does not exist");
        }
    }
    if let Some(category_id) = payload.category_id {
        if Categories::find_by_id(category_id).one(&state.orm).await?.is_none() {
            errors.add("category_id", "category does not exist");
        }
    }
    if !payload.attributes.is_empty() {
        let defs: Vec<Attribute> = Attributes::find()
            .all(&state.orm)
            .await?
            .into_iter()
            .map(Attribute::from)
            .collect();
        errors.merge(validate_attributes(&payload.attributes, &defs));
    }

    errors.into_result()
}

/// Every key must name a defined attribute; attributes with a value list only
/// accept values from it.
pub fn validate_attributes(values: &BTreeMap<String, String>, defs: &[Attribute]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for (key, value) in values {
        let field = format!("attributes.{key}");
        match defs.iter().find(|d| d.slug == *key) {
            None => errors.add(field, "unknown attribute"),
            Some(def) if !def.allowed_values.is_empty() && !def.allowed_values.contains(value) => {
                errors.add(field, format!("must be one of {}", def.allowed_values.join(", ")))
            }
            Some(_) => {}
        }
    }
    errors
}

pub(crate) async fn find_brand<C: ConnectionTrait>(conn: &C, key: &str) -> AppResult<Option<BrandModel>> {
    let by_key = match Uuid::parse_str(key) {
        Ok(id) => BrandCol::Id.eq(id),
        Err(_) => BrandCol::Slug.eq(key),
    };
    Ok(Brands::find().filter(by_key).one(conn).await?)
}

pub(crate) async fn find_category<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> AppResult<Option<CategoryModel>> {
    let by_key = match Uuid::parse_str(key) {
        Ok(id) => CategoryCol::Id.eq(id),
        Err(_) => CategoryCol::Slug.eq(key),
    };
    Ok(Categories::find().filter(by_key).one(conn).await?)
}

async fn hydrate_one(state: &AppState, model: ProductModel) -> AppResult<Product> {
    hydrate_products(&state.orm, &display_context(state), vec![model])
        .await?
        .pop()
        .ok_or(AppError::NotFound)
}

/// Attach brand and category names to a batch of products, keeping order.
pub(crate) async fn hydrate_products<C: ConnectionTrait>(
    conn: &C,
    ctx: &DisplayContext<'_>,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let brand_ids: Vec<Uuid> = models.iter().filter_map(|p| p.brand_id).collect();
    let category_ids: Vec<Uuid> = models.iter().filter_map(|p| p.category_id).collect();

    let brands: HashMap<Uuid, BrandModel> = if brand_ids.is_empty() {
        HashMap::new()
    } else {
        Brands::find()
            .filter(BrandCol::Id.is_in(brand_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|b| (b.id, b))
            .collect()
    };
    let categories: HashMap<Uuid, CategoryModel> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        Categories::find()
            .filter(CategoryCol::Id.is_in(category_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    Ok(models
        .into_iter()
        .map(|model| {
            let brand = model.brand_id.and_then(|id| brands.get(&id));
            let category = model.category_id.and_then(|id| categories.get(&id));
            Product::from_entity(model, brand, category, ctx)
        })
        .collect())
}

pub(crate) fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(slug: &str, allowed: &[&str]) -> Attribute {
        Attribute {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            allowed_values: allowed.iter().map(|v| v.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn attributes_must_be_defined_and_allowed() {
        let defs = vec![attribute("color", &["red", "blue"]), attribute("material", &[])];
        let mut values = BTreeMap::new();
        values.insert("color".to_string(), "green".to_string());
        values.insert("material".to_string(), "steel".to_string());
        values.insert("size".to_string(), "xl".to_string());

        let errors = validate_attributes(&values, &defs);
        assert!(errors.contains("attributes.color"));
        assert!(errors.contains("attributes.size"));
        assert!(!errors.contains("attributes.material"));
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
