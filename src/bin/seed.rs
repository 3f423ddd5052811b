use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use serde_json::json;
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&orm_from_pool(pool.clone())).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin12345", "Store Admin", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user12345", "Demo Shopper", "user").await?;

    let acme = upsert_brand(&pool, "Acme Tools", "acme-tools").await?;
    let zenith = upsert_brand(&pool, "Zenith Audio", "zenith-audio").await?;

    let electronics = upsert_category(&pool, "Electronics", "electronics", None).await?;
    let audio = upsert_category(&pool, "Audio", "audio", Some(electronics)).await?;
    let hardware = upsert_category(&pool, "Hardware", "hardware", None).await?;

    seed_attributes(&pool).await?;
    seed_products(&pool, &[(acme, hardware), (zenith, audio)]).await?;
    seed_banner(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    email: &str,
    password: &str,
    full_name: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(full_name)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(id)
}

async fn upsert_brand(pool: &DbPool, name: &str, slug: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO brands (id, name, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn upsert_category(
    pool: &DbPool,
    name: &str,
    slug: &str,
    parent_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug, parent_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name, parent_id = EXCLUDED.parent_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_attributes(pool: &DbPool) -> anyhow::Result<()> {
    let attributes = [
        ("Colour", "colour", json!(["black", "white", "red"])),
        ("Warranty", "warranty", json!(["1 year", "2 years"])),
    ];
    for (name, slug, values) in attributes {
        sqlx::query(
            r#"
            INSERT INTO attributes (id, name, slug, allowed_values)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(values)
        .execute(pool)
        .await?;
    }
    println!("Seeded attributes");
    Ok(())
}

/// `owners[0]` is the hardware line, `owners[1]` the audio line.
async fn seed_products(pool: &DbPool, owners: &[(Uuid, Uuid); 2]) -> anyhow::Result<()> {
    let products = [
        ("Cordless Drill 18V", "cordless-drill-18v", 549_900_i64, Some(649_900_i64), 25, 0, false, json!({"colour": "red", "warranty": "2 years"})),
        ("Socket Set 46pc", "socket-set-46pc", 189_900, None, 3, 0, false, json!({"warranty": "1 year"})),
        ("Industrial Compressor", "industrial-compressor", 4_500_000, None, 10, 0, true, json!({})),
        ("Wireless Earbuds", "wireless-earbuds", 299_900, Some(399_900), 60, 1, false, json!({"colour": "black"})),
        ("Bookshelf Speakers", "bookshelf-speakers", 1_249_900, None, 8, 1, false, json!({"colour": "white", "warranty": "1 year"})),
    ];

    for (name, slug, price, mrp, stock, owner, is_b2b, attributes) in products {
        let (brand_id, category_id) = owners[owner];
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, slug, description, price, mrp, stock, brand_id, category_id, attributes, is_b2b)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(format!("{name} from the demo catalog."))
        .bind(price)
        .bind(mrp)
        .bind(stock)
        .bind(brand_id)
        .bind(category_id)
        .bind(attributes)
        .bind(is_b2b)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_banner(pool: &DbPool) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM banners")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO banners (id, title, subtitle, image_url, link_url, position)
        VALUES ($1, $2, $3, $4, $5, 0)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Season sale")
    .bind("Up to 15% off power tools")
    .bind("https://images.example.com/banners/season-sale.jpg")
    .bind("/categories/hardware")
    .execute(pool)
    .await?;

    println!("Seeded banner");
    Ok(())
}
