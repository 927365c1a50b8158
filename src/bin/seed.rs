use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

use storefront_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{
        addresses::ActiveModel as AddressActive, product_groups::ActiveModel as GroupActive,
        products::ActiveModel as ProductActive,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let demo_user = Uuid::new_v4();

    seed_products(&orm).await?;
    seed_address(&orm, demo_user).await?;

    println!("Seed completed. Demo user ID: {demo_user}");
    Ok(())
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    // An ungrouped product priced off its flat fields.
    ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Steel Water Bottle".into()),
        category: Set(Some("Kitchen".into())),
        brand: Set(Some("Aqua".into())),
        description: Set(Some("1L insulated bottle".into())),
        selling_price: Set(700),
        discount: Set(50),
        quantity: Set(Some(25)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;

    // A grouped product; each variant combination carries its own price
    // and stock.
    let shirt = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Linen Shirt".into()),
        category: Set(Some("Apparel".into())),
        brand: Set(Some("Loom".into())),
        description: Set(Some("Relaxed fit".into())),
        selling_price: Set(1200),
        discount: Set(100),
        quantity: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(orm)
    .await?;

    for (color, size, price, quantity) in [
        ("White", "M", 1200, 8),
        ("White", "L", 1200, 4),
        ("Indigo", "M", 1350, 2),
    ] {
        GroupActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(shirt.id),
            color: Set(Some(color.into())),
            size: Set(Some(size.into())),
            material: Set(Some("Linen".into())),
            price: Set(price),
            quantity: Set(quantity),
        }
        .insert(orm)
        .await?;
    }

    Ok(())
}

async fn seed_address(orm: &OrmConn, user_id: Uuid) -> anyhow::Result<()> {
    AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set("Demo User".into()),
        phone: Set("9999999999".into()),
        address: Set("12 Demo Street".into()),
        city: Set("Pune".into()),
        pin_code: Set("411001".into()),
        state: Set("Maharashtra".into()),
        landmark: Set(None),
        address_type: Set(Some("home".into())),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    Ok(())
}
