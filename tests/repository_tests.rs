//! Repository tests against an in-memory SQLite database.

use catalog::auth::Role;
use catalog::cache::CacheTag;
use catalog::error::RepositoryError;
use catalog::pagination::Pagination;
use catalog::repositories::{
    BrandRepository, CustomerRepository, ProductRepository, UserRepository,
    customer::NewCustomer, product::NewProduct, user::UserFields,
};

#[path = "test_utils/mod.rs"]
mod test_utils;

fn new_customer(name: &str, email: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        email: email.to_string(),
        roles: vec![Role::Customer],
        password_hash: String::new(),
    }
}

fn fields(email: &str) -> UserFields {
    UserFields {
        username: "jdoe".to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: email.to_string(),
    }
}

#[tokio::test]
async fn customer_email_is_unique_and_slugged() {
    let db = test_utils::setup_test_db().await.unwrap();
    let repo = CustomerRepository::new(&db);

    let created = repo
        .create(new_customer("Orange & Co.", "Contact@Orange.com"))
        .await
        .unwrap();
    assert_eq!(created.slug, "orange-co");
    assert_eq!(created.email, "contact@orange.com");
    assert_eq!(created.role_names(), vec!["ROLE_CUSTOMER"]);

    let duplicate = repo
        .create(new_customer("Other", "contact@orange.com"))
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Conflict(_))));

    let blank = repo.create(new_customer("   ", "blank@orange.com")).await;
    assert!(matches!(blank, Err(RepositoryError::Validation(_))));
}

#[tokio::test]
async fn deleting_customer_removes_its_users_only() {
    let db = test_utils::setup_test_db().await.unwrap();
    let customers = CustomerRepository::new(&db);
    let users = UserRepository::new(&db);

    let orange = customers
        .create(new_customer("Orange", "orange@pro.com"))
        .await
        .unwrap();
    let sfr = customers
        .create(new_customer("Sfr", "sfr@pro.com"))
        .await
        .unwrap();
    let first = users.create(orange.id, fields("a@gmail.com")).await.unwrap();
    let second = users.create(orange.id, fields("b@gmail.com")).await.unwrap();
    users.create(sfr.id, fields("c@gmail.com")).await.unwrap();

    let removal = customers.delete_with_users(orange.id).await.unwrap();

    assert_eq!(removal.customer_id, orange.id);
    let mut removed = removal.removed_user_ids.clone();
    removed.sort();
    assert_eq!(removed, vec![first.id, second.id]);
    assert!(customers.find_by_id(orange.id).await.unwrap().is_none());
    assert_eq!(users.count_by_customer(sfr.id).await.unwrap(), 1);

    let tags = removal.cache_tags();
    assert_eq!(tags.len(), 3);
    assert!(tags.contains(&CacheTag::UserList {
        customer_id: orange.id
    }));
    assert!(tags.contains(&CacheTag::UserDetail { user_id: first.id }));
    assert!(tags.contains(&CacheTag::UserDetail { user_id: second.id }));

    assert!(matches!(
        customers.delete_with_users(orange.id).await,
        Err(RepositoryError::NotFound(_))
    ));
}

#[tokio::test]
async fn user_pages_are_scoped_and_counted() {
    let db = test_utils::setup_test_db().await.unwrap();
    let customer = CustomerRepository::new(&db)
        .create(new_customer("Orange", "orange@pro.com"))
        .await
        .unwrap();
    let users = UserRepository::new(&db);
    for index in 0..5 {
        users
            .create(customer.id, fields(&format!("u{index}@gmail.com")))
            .await
            .unwrap();
    }

    let (page, total) = users
        .find_page_by_customer(customer.id, Pagination::new(2, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(total, 5);
    let emails: Vec<&str> = page.iter().map(|user| user.email.as_str()).collect();
    assert_eq!(emails, vec!["u2@gmail.com", "u1@gmail.com"]);

    assert!(users.email_taken("u0@gmail.com", None).await.unwrap());
    let own = users.find_by_email("u0@gmail.com").await.unwrap().unwrap();
    assert!(!users.email_taken("u0@gmail.com", Some(own.id)).await.unwrap());
}

#[tokio::test]
async fn products_join_their_brand() {
    let db = test_utils::setup_test_db().await.unwrap();
    let brands = BrandRepository::new(&db);
    let brand = brands.find_or_create("Xiaomi").await.unwrap();
    assert_eq!(brands.find_or_create("xiaomi").await.unwrap().id, brand.id);

    let products = ProductRepository::new(&db);
    let created = products
        .create(NewProduct {
            name: "Redmi 13 Pro".to_string(),
            description: "Phone".to_string(),
            price_cents: 29_900,
            brand_id: brand.id,
        })
        .await
        .unwrap();
    assert_eq!(created.slug, "redmi-13-pro");

    let (product, joined) = products.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(product.formatted_price(), "299.00");
    assert_eq!(joined.unwrap().name, "Xiaomi");

    let negative = products
        .create(NewProduct {
            name: "Broken".to_string(),
            description: String::new(),
            price_cents: -1,
            brand_id: brand.id,
        })
        .await;
    assert!(matches!(negative, Err(RepositoryError::Validation(_))));
}

#[tokio::test]
async fn non_ascii_brand_names_stay_distinct() {
    let db = test_utils::setup_test_db().await.unwrap();
    let brands = BrandRepository::new(&db);

    let eclair = brands.find_or_create("Éclair").await.unwrap();
    let omega = brands.find_or_create("Ωmega").await.unwrap();
    let delta = brands.find_or_create("Δelta").await.unwrap();

    assert_eq!(eclair.slug, "éclair");
    assert_ne!(omega.id, delta.id);
    assert_eq!(brands.find_or_create("éclair").await.unwrap().id, eclair.id);

    let symbols = brands.find_or_create("???").await;
    assert!(matches!(symbols, Err(RepositoryError::Validation(_))));
}
