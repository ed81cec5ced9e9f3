//! Demo data seeding
//!
//! Populates an empty database with a small catalog and a handful of
//! customers owning users. Every section is skipped when its table already
//! has rows, so running the seeder twice is harmless.

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use sea_orm::DatabaseConnection;

use crate::auth::{Role, hash_password};
use crate::repositories::{
    BrandRepository, CustomerRepository, ProductRepository, UserRepository,
    customer::NewCustomer, product::NewProduct, user::UserFields,
};
use crate::text::{capitalize_first, slugify};

const BRANDS: [&str; 5] = ["Apple", "Samsung", "Huawei", "Xiaomi", "LG"];

const CUSTOMERS: [&str; 5] = [
    "Orange Mobile",
    "Bouygues Telecom",
    "Free Mobile",
    "Sfr Distribution",
    "Boulanger",
];

/// Password of every seeded customer.
pub const DEMO_PASSWORD: &str = "secret";

const PRODUCT_WORDS: [&str; 5] = ["Galaxy", "Nova", "Redmi", "Velvet", "Mate"];
const PRODUCT_SUFFIXES: [&str; 4] = ["X", "Pro", "Max", "Plus"];

const USERS: [(&str, &str); 10] = [
    ("camille", "martin"),
    ("louis", "bernard"),
    ("chloe", "dubois"),
    ("hugo", "thomas"),
    ("lea", "robert"),
    ("jules", "richard"),
    ("manon", "petit"),
    ("gabriel", "durand"),
    ("ines", "leroy"),
    ("arthur", "moreau"),
];

/// Rows created by one seeding run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub customers: usize,
    pub products: usize,
    pub users: usize,
}

/// Seeds brands, customers, products and users into empty tables.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<SeedReport> {
    let mut rng = StdRng::from_entropy();
    let mut report = SeedReport::default();

    let brand_repo = BrandRepository::new(db);
    let mut brand_ids = Vec::with_capacity(BRANDS.len());
    for name in BRANDS {
        let brand = brand_repo
            .find_or_create(name)
            .await
            .with_context(|| format!("seeding brand {name}"))?;
        brand_ids.push(brand.id);
    }

    let customer_repo = CustomerRepository::new(db);
    if customer_repo.count().await? == 0 {
        let password_hash =
            hash_password(DEMO_PASSWORD).context("hashing demo customer password")?;
        for name in CUSTOMERS {
            customer_repo
                .create(NewCustomer {
                    name: name.to_string(),
                    email: format!("{}@pro.com", slugify(name)),
                    roles: vec![Role::Customer],
                    password_hash: password_hash.clone(),
                })
                .await
                .with_context(|| format!("seeding customer {name}"))?;
            report.customers += 1;
        }
    } else {
        log::info!("Customers already present, skipping customer seed");
    }

    let product_repo = ProductRepository::new(db);
    if product_repo.count().await? == 0 {
        for _ in 0..5 {
            let name = format!(
                "{} {} {}",
                PRODUCT_WORDS.choose(&mut rng).copied().unwrap_or("Phone"),
                rng.gen_range(100..1000),
                PRODUCT_SUFFIXES.choose(&mut rng).copied().unwrap_or("X"),
            );
            let brand_id = *brand_ids.choose(&mut rng).context("no brand available")?;
            product_repo
                .create(NewProduct {
                    description: format!("{name}, unlocked, dual SIM."),
                    name,
                    price_cents: rng.gen_range(50_000..=200_000),
                    brand_id,
                })
                .await
                .context("seeding product")?;
            report.products += 1;
        }
    } else {
        log::info!("Products already present, skipping product seed");
    }

    let customer_ids: Vec<i32> = customer_repo
        .find_all()
        .await?
        .into_iter()
        .map(|customer| customer.id)
        .collect();
    let user_repo = UserRepository::new(db);
    for (first_name, last_name) in USERS {
        let email = format!("{first_name}.{last_name}@gmail.com");
        if user_repo.find_by_email(&email).await?.is_some() {
            continue;
        }
        let Some(&customer_id) = customer_ids.choose(&mut rng) else {
            break;
        };

        user_repo
            .create(
                customer_id,
                UserFields {
                    username: format!("{}{}", slugify(first_name), rng.gen_range(1..=100)),
                    first_name: capitalize_first(first_name),
                    last_name: capitalize_first(last_name),
                    email,
                },
            )
            .await
            .with_context(|| format!("seeding user {first_name} {last_name}"))?;
        report.users += 1;
    }

    log::info!(
        "Demo data seeded: {} customers, {} products, {} users",
        report.customers,
        report.products,
        report.users
    );
    Ok(report)
}
