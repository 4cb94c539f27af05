use std::collections::HashMap;

use crate::models::{Product, Role};

pub mod extract;
pub mod loader;
pub mod role;

pub use loader::{load_catalog, load_catalog_from_reader};

/// Read-only product index partitioned by role and keyed by SKU
///
/// Built once at startup; the recommendation core only ever reads from it.
#[derive(Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
    by_sku: HashMap<String, usize>,
    by_role: HashMap<Role, Vec<usize>>,
}

impl Catalog {
    /// Indexes products in load order. Products without a SKU stay listed but
    /// cannot be looked up; a repeated SKU resolves to its last occurrence.
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut by_sku = HashMap::new();
        let mut by_role: HashMap<Role, Vec<usize>> =
            Role::ALL.iter().map(|role| (*role, Vec::new())).collect();

        for (index, product) in products.iter().enumerate() {
            if !product.sku.is_empty() {
                by_sku.insert(product.sku.clone(), index);
            }
            by_role.entry(product.role).or_default().push(index);
        }

        Self {
            products,
            by_sku,
            by_role,
        }
    }

    pub fn get(&self, sku: &str) -> Option<&Product> {
        self.by_sku.get(sku).map(|&i| &self.products[i])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products of one role, in load order
    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &Product> + '_ {
        self.by_role
            .get(&role)
            .into_iter()
            .flatten()
            .map(move |&i| &self.products[i])
    }

    pub fn role_count(&self, role: Role) -> usize {
        self.by_role.get(&role).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
