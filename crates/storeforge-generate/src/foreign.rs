use rand::Rng;

use storeforge_core::{Customer, Product, Segment};

use crate::errors::GenerationError;

/// Parent attributes a transaction needs from its customer.
#[derive(Debug, Clone)]
pub struct CustomerRef {
    pub customer_id: String,
    pub segment: Segment,
}

/// Parent attributes a transaction needs from its product.
#[derive(Debug, Clone)]
pub struct ProductRef {
    pub product_id: String,
    pub price: f64,
}

/// Source of parent rows for foreign-key columns.
pub trait ForeignContext {
    fn pick_customer(&self, rng: &mut dyn rand::RngCore) -> Result<&CustomerRef, GenerationError>;
    fn pick_product(&self, rng: &mut dyn rand::RngCore) -> Result<&ProductRef, GenerationError>;
}

/// Parents generated earlier in the same run.
#[derive(Debug, Default)]
pub struct InMemoryForeignContext {
    customers: Vec<CustomerRef>,
    products: Vec<ProductRef>,
}

impl InMemoryForeignContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest_customers(&mut self, rows: &[Customer]) {
        self.customers = rows
            .iter()
            .map(|row| CustomerRef {
                customer_id: row.customer_id.clone(),
                segment: row.segment,
            })
            .collect();
    }

    pub fn ingest_products(&mut self, rows: &[Product]) {
        self.products = rows
            .iter()
            .map(|row| ProductRef {
                product_id: row.product_id.clone(),
                price: row.price,
            })
            .collect();
    }
}

impl ForeignContext for InMemoryForeignContext {
    fn pick_customer(&self, rng: &mut dyn rand::RngCore) -> Result<&CustomerRef, GenerationError> {
        pick(&self.customers, rng, "customers")
    }

    fn pick_product(&self, rng: &mut dyn rand::RngCore) -> Result<&ProductRef, GenerationError> {
        pick(&self.products, rng, "products")
    }
}

fn pick<'a, T>(
    values: &'a [T],
    rng: &mut dyn rand::RngCore,
    table: &str,
) -> Result<&'a T, GenerationError> {
    if values.is_empty() {
        return Err(GenerationError::InvalidConfig(format!(
            "no parent rows for fk into {table}"
        )));
    }
    let idx = rng.random_range(0..values.len());
    Ok(&values[idx])
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn empty_pool_is_an_error() {
        let context = InMemoryForeignContext::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(context.pick_customer(&mut rng).is_err());
        assert!(context.pick_product(&mut rng).is_err());
    }
}
