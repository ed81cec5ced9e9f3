//! Cache keys and invalidation tags.

use std::fmt;

use crate::pagination::Pagination;
use crate::versioning::ApiVersion;

/// Deterministic cache key: an operation name plus ordered parameters,
/// rendered as `operation[name=value,...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    params: Vec<(&'static str, String)>,
}

impl CacheKey {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    /// Appends a parameter. Order of calls is preserved in the rendered key.
    pub fn with(mut self, name: &'static str, value: impl fmt::Display) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    fn with_page(self, pagination: Pagination) -> Self {
        self.with("page", pagination.page())
            .with("limit", pagination.limit())
    }

    /// Global user listing of one owning customer.
    pub fn user_list(owner_id: i32, pagination: Pagination, version: ApiVersion) -> Self {
        Self::new("users.list")
            .with("owner", owner_id)
            .with_page(pagination)
            .with("version", version)
    }

    pub fn user_detail(user_id: i32, owner_id: i32, version: ApiVersion) -> Self {
        Self::new("users.detail")
            .with("owner", owner_id)
            .with("id", user_id)
            .with("version", version)
    }

    /// Listing under `/customers/{customer_id}/users`.
    pub fn customer_user_list(
        customer_id: i32,
        pagination: Pagination,
        version: ApiVersion,
    ) -> Self {
        Self::new("customer_users.list")
            .with("owner", customer_id)
            .with_page(pagination)
            .with("version", version)
    }

    pub fn customer_user_detail(customer_id: i32, user_id: i32, version: ApiVersion) -> Self {
        Self::new("customer_users.detail")
            .with("owner", customer_id)
            .with("id", user_id)
            .with("version", version)
    }

    pub fn product_list(pagination: Pagination, version: ApiVersion) -> Self {
        Self::new("products.list")
            .with_page(pagination)
            .with("version", version)
    }

    pub fn product_detail(product_id: i32, version: ApiVersion) -> Self {
        Self::new("products.detail")
            .with("id", product_id)
            .with("version", version)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.operation)?;
        for (index, (name, value)) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("]")
    }
}

/// Invalidation scope attached to cached entries.
///
/// Readers and writers share these variants, so a mutation can only evict
/// what a listing or detail actually registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Every user listing page owned by one customer
    UserList { customer_id: i32 },
    /// Every cached representation of one user
    UserDetail { user_id: i32 },
    ProductList,
    ProductDetail { product_id: i32 },
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTag::UserList { customer_id } => write!(f, "users:list:customer:{customer_id}"),
            CacheTag::UserDetail { user_id } => write!(f, "users:detail:{user_id}"),
            CacheTag::ProductList => f.write_str("products:list"),
            CacheTag::ProductDetail { product_id } => write!(f, "products:detail:{product_id}"),
        }
    }
}
