//! Brands, categories, banners and attribute definitions: storefront reads and
//! admin writes.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::catalog::{
        AttributeInput, AttributeList, BannerInput, BannerList, BrandDetail, BrandInput, BrandList,
        CategoryDetail, CategoryInput, CategoryList, CategoryTree,
    },
    entity::{
        attributes::{ActiveModel as AttributeActive, Column as AttributeCol, Entity as Attributes},
        banners::{ActiveModel as BannerActive, Column as BannerCol, Entity as Banners},
        brands::{ActiveModel as BrandActive, Column as BrandCol, Entity as Brands},
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, FieldErrors},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Attribute, Banner, Brand, Category, build_category_tree},
    response::{ApiResponse, Meta},
    services::{
        display_context, non_empty,
        product_service::{find_brand, find_category, hydrate_products},
        resolve_slug,
    },
    state::AppState,
};

const LISTING_LIMIT: u64 = 100;

/// `root` followed by every category below it, breadth first.
pub fn descendant_ids(links: &[(Uuid, Option<Uuid>)], root: Uuid) -> Vec<Uuid> {
    let mut ids = vec![root];
    let mut cursor = 0;
    while cursor < ids.len() {
        let current = ids[cursor];
        for (id, parent) in links {
            if *parent == Some(current) && !ids.contains(id) {
                ids.push(*id);
            }
        }
        cursor += 1;
    }
    ids
}

/// Whether making `parent` the parent of `id` would close a loop.
pub fn creates_cycle(links: &[(Uuid, Option<Uuid>)], id: Uuid, parent: Uuid) -> bool {
    let mut current = Some(parent);
    let mut steps = 0;
    while let Some(node) = current {
        if node == id {
            return true;
        }
        steps += 1;
        if steps > links.len() {
            return true;
        }
        current = links
            .iter()
            .find(|(candidate, _)| *candidate == node)
            .and_then(|(_, p)| *p);
    }
    false
}

pub(crate) async fn category_links<C: ConnectionTrait>(
    conn: &C,
) -> AppResult<Vec<(Uuid, Option<Uuid>)>> {
    Ok(Categories::find()
        .select_only()
        .column(CategoryCol::Id)
        .column(CategoryCol::ParentId)
        .into_tuple()
        .all(conn)
        .await?)
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let ctx = display_context(state);
    let items = Brands::find()
        .filter(BrandCol::IsActive.eq(true))
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|b| Brand::from_entity(b, &ctx))
        .collect();
    Ok(ApiResponse::success("Brands", BrandList { items }, Some(Meta::empty())))
}

pub async fn get_brand(state: &AppState, key: &str) -> AppResult<ApiResponse<BrandDetail>> {
    let brand = find_brand(&state.orm, key)
        .await?
        .filter(|b| b.is_active)
        .ok_or(AppError::NotFound)?;

    let products = Products::find()
        .filter(ProdCol::BrandId.eq(brand.id))
        .filter(ProdCol::IsActive.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(LISTING_LIMIT)
        .all(&state.orm)
        .await?;

    let ctx = display_context(state);
    let products = hydrate_products(&state.orm, &ctx, products).await?;
    Ok(ApiResponse::success(
        "Brand",
        BrandDetail {
            brand: Brand::from_entity(brand, &ctx),
            products,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = active_categories(state).await?;
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(Meta::empty())))
}

pub async fn category_tree(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let items = build_category_tree(active_categories(state).await?);
    Ok(ApiResponse::success("Category tree", CategoryTree { items }, Some(Meta::empty())))
}

async fn active_categories(state: &AppState) -> AppResult<Vec<Category>> {
    let ctx = display_context(state);
    Ok(Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| Category::from_entity(c, &ctx))
        .collect())
}

pub async fn get_category(state: &AppState, key: &str) -> AppResult<ApiResponse<CategoryDetail>> {
    let category = find_category(&state.orm, key)
        .await?
        .filter(|c| c.is_active)
        .ok_or(AppError::NotFound)?;

    let ctx = display_context(state);
    let children = Categories::find()
        .filter(CategoryCol::ParentId.eq(category.id))
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| Category::from_entity(c, &ctx))
        .collect();

    let ids = descendant_ids(&category_links(&state.orm).await?, category.id);
    let products = Products::find()
        .filter(ProdCol::CategoryId.is_in(ids))
        .filter(ProdCol::IsActive.eq(true))
        .order_by_desc(ProdCol::CreatedAt)
        .limit(LISTING_LIMIT)
        .all(&state.orm)
        .await?;
    let products = hydrate_products(&state.orm, &ctx, products).await?;

    Ok(ApiResponse::success(
        "Category",
        CategoryDetail {
            category: Category::from_entity(category, &ctx),
            children,
            products,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_banners(state: &AppState) -> AppResult<ApiResponse<BannerList>> {
    banners(state, true).await
}

pub async fn list_attributes(state: &AppState) -> AppResult<ApiResponse<AttributeList>> {
    let items = Attributes::find()
        .order_by_asc(AttributeCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Attribute::from)
        .collect();
    Ok(ApiResponse::success("Attributes", AttributeList { items }, Some(Meta::empty())))
}

async fn banners(state: &AppState, active_only: bool) -> AppResult<ApiResponse<BannerList>> {
    let ctx = display_context(state);
    let mut finder = Banners::find();
    if active_only {
        finder = finder.filter(BannerCol::IsActive.eq(true));
    }
    let items = finder
        .order_by_asc(BannerCol::Position)
        .order_by_asc(BannerCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|b| Banner::from_entity(b, &ctx))
        .collect();
    Ok(ApiResponse::success("Banners", BannerList { items }, Some(Meta::empty())))
}

// Admin

pub async fn admin_list_brands(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BrandList>> {
    ensure_admin(user)?;
    let ctx = display_context(state);
    let items = Brands::find()
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|b| Brand::from_entity(b, &ctx))
        .collect();
    Ok(ApiResponse::success("Brands", BrandList { items }, Some(Meta::empty())))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: BrandInput,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    payload.validate()?;
    let slug = resolve_slug::<Brands, _>(
        &state.orm,
        BrandCol::Slug,
        BrandCol::Id,
        &payload.name,
        payload.slug.as_deref(),
        None,
    )
    .await?;

    let brand = BrandActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(non_empty(payload.description)),
        logo_url: Set(non_empty(payload.logo_url)),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "brand_create",
        "brands",
        serde_json::json!({ "brand_id": brand.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success("Brand created", Brand::from_entity(brand, &ctx), Some(Meta::empty())))
}

pub async fn update_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: BrandInput,
) -> AppResult<ApiResponse<Brand>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Brands::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let slug = if payload.slug.is_none() && existing.name == payload.name.trim() {
        existing.slug.clone()
    } else {
        resolve_slug::<Brands, _>(
            &state.orm,
            BrandCol::Slug,
            BrandCol::Id,
            &payload.name,
            payload.slug.as_deref(),
            Some(id),
        )
        .await?
    };

    let mut active: BrandActive = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(slug);
    active.description = Set(non_empty(payload.description));
    active.logo_url = Set(non_empty(payload.logo_url));
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let brand = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "brand_update",
        "brands",
        serde_json::json!({ "brand_id": brand.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success("Brand updated", Brand::from_entity(brand, &ctx), Some(Meta::empty())))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Brands::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        Some(user.user_id),
        "brand_delete",
        "brands",
        serde_json::json!({ "brand_id": id }),
    )
    .await;
    Ok(ApiResponse::success("Brand deleted", serde_json::json!({ "id": id }), Some(Meta::empty())))
}

pub async fn admin_list_categories(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_admin(user)?;
    let ctx = display_context(state);
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|c| Category::from_entity(c, &ctx))
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(Meta::empty())))
}

async fn check_parent(state: &AppState, id: Option<Uuid>, parent_id: Option<Uuid>) -> AppResult<()> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let mut errors = FieldErrors::new();
    if Some(parent_id) == id {
        errors.add("parent_id", "a category cannot be its own parent");
    } else {
        let links = category_links(&state.orm).await?;
        if !links.iter().any(|(candidate, _)| *candidate == parent_id) {
            errors.add("parent_id", "parent category does not exist");
        } else if let Some(id) = id {
            if creates_cycle(&links, id, parent_id) {
                errors.add("parent_id", "parent is a descendant of this category");
            }
        }
    }
    errors.into_result()
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CategoryInput,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    check_parent(state, None, payload.parent_id).await?;
    let slug = resolve_slug::<Categories, _>(
        &state.orm,
        CategoryCol::Slug,
        CategoryCol::Id,
        &payload.name,
        payload.slug.as_deref(),
        None,
    )
    .await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        parent_id: Set(payload.parent_id),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(non_empty(payload.description)),
        image_url: Set(non_empty(payload.image_url)),
        is_active: Set(payload.is_active),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success(
        "Category created",
        Category::from_entity(category, &ctx),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CategoryInput,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    check_parent(state, Some(id), payload.parent_id).await?;

    let slug = if payload.slug.is_none() && existing.name == payload.name.trim() {
        existing.slug.clone()
    } else {
        resolve_slug::<Categories, _>(
            &state.orm,
            CategoryCol::Slug,
            CategoryCol::Id,
            &payload.name,
            payload.slug.as_deref(),
            Some(id),
        )
        .await?
    };

    let mut active: CategoryActive = existing.into();
    active.parent_id = Set(payload.parent_id);
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(slug);
    active.description = Set(non_empty(payload.description));
    active.image_url = Set(non_empty(payload.image_url));
    active.is_active = Set(payload.is_active);
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success(
        "Category updated",
        Category::from_entity(category, &ctx),
        Some(Meta::empty()),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;
    Ok(ApiResponse::success(
        "Category deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

pub async fn admin_list_banners(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BannerList>> {
    ensure_admin(user)?;
    banners(state, false).await
}

pub async fn create_banner(
    state: &AppState,
    user: &AuthUser,
    payload: BannerInput,
) -> AppResult<ApiResponse<Banner>> {
    ensure_admin(user)?;
    payload.validate()?;
    let banner = BannerActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title.trim().to_string()),
        subtitle: Set(non_empty(payload.subtitle)),
        image_url: Set(payload.image_url.trim().to_string()),
        link_url: Set(non_empty(payload.link_url)),
        position: Set(payload.position),
        is_active: Set(payload.is_active),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "banner_create",
        "banners",
        serde_json::json!({ "banner_id": banner.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success("Banner created", Banner::from_entity(banner, &ctx), Some(Meta::empty())))
}

pub async fn update_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: BannerInput,
) -> AppResult<ApiResponse<Banner>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Banners::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: BannerActive = existing.into();
    active.title = Set(payload.title.trim().to_string());
    active.subtitle = Set(non_empty(payload.subtitle));
    active.image_url = Set(payload.image_url.trim().to_string());
    active.link_url = Set(non_empty(payload.link_url));
    active.position = Set(payload.position);
    active.is_active = Set(payload.is_active);
    let banner = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "banner_update",
        "banners",
        serde_json::json!({ "banner_id": banner.id }),
    )
    .await;

    let ctx = display_context(state);
    Ok(ApiResponse::success("Banner updated", Banner::from_entity(banner, &ctx), Some(Meta::empty())))
}

pub async fn delete_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Banners::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        Some(user.user_id),
        "banner_delete",
        "banners",
        serde_json::json!({ "banner_id": id }),
    )
    .await;
    Ok(ApiResponse::success("Banner deleted", serde_json::json!({ "id": id }), Some(Meta::empty())))
}

fn clean_values(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

pub async fn create_attribute(
    state: &AppState,
    user: &AuthUser,
    payload: AttributeInput,
) -> AppResult<ApiResponse<Attribute>> {
    ensure_admin(user)?;
    payload.validate()?;
    let slug = resolve_slug::<Attributes, _>(
        &state.orm,
        AttributeCol::Slug,
        AttributeCol::Id,
        &payload.name,
        payload.slug.as_deref(),
        None,
    )
    .await?;

    let attribute = AttributeActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        allowed_values: Set(serde_json::json!(clean_values(payload.allowed_values))),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "attribute_create",
        "attributes",
        serde_json::json!({ "attribute_id": attribute.id }),
    )
    .await;

    Ok(ApiResponse::success("Attribute created", attribute.into(), Some(Meta::empty())))
}

pub async fn update_attribute(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AttributeInput,
) -> AppResult<ApiResponse<Attribute>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Attributes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let slug = if payload.slug.is_none() && existing.name == payload.name.trim() {
        existing.slug.clone()
    } else {
        resolve_slug::<Attributes, _>(
            &state.orm,
            AttributeCol::Slug,
            AttributeCol::Id,
            &payload.name,
            payload.slug.as_deref(),
            Some(id),
        )
        .await?
    };

    let mut active: AttributeActive = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.slug = Set(slug);
    active.allowed_values = Set(serde_json::json!(clean_values(payload.allowed_values)));
    let attribute = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "attribute_update",
        "attributes",
        serde_json::json!({ "attribute_id": attribute.id }),
    )
    .await;

    Ok(ApiResponse::success("Attribute updated", attribute.into(), Some(Meta::empty())))
}

pub async fn delete_attribute(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Attributes::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        Some(user.user_id),
        "attribute_delete",
        "attributes",
        serde_json::json!({ "attribute_id": id }),
    )
    .await;
    Ok(ApiResponse::success(
        "Attribute deleted",
        serde_json::json!({ "id": id }),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendants_include_grandchildren() {
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        let other = Uuid::new_v4();
        let links = vec![
            (root, None),
            (child, Some(root)),
            (grandchild, Some(child)),
            (other, None),
        ];
        assert_eq!(descendant_ids(&links, root), vec![root, child, grandchild]);
        assert_eq!(descendant_ids(&links, other), vec![other]);
    }

    #[test]
    fn reparenting_under_a_descendant_is_a_cycle() {
        let root = Uuid::new_v4();
        let child = Uuid::new_v4();
        let sibling = Uuid::new_v4();
        let links = vec![(root, None), (child, Some(root)), (sibling, None)];
        assert!(creates_cycle(&links, root, child));
        assert!(!creates_cycle(&links, child, sibling));
    }

    #[test]
    fn allowed_values_are_trimmed_and_deduplicated() {
        let values = vec![" red".to_string(), "red".to_string(), String::new(), "blue".into()];
        assert_eq!(clean_values(values), vec!["red", "blue"]);
    }
}
