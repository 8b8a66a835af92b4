use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockdate_core::{Aggregate, AggregateRoot, DomainError, ProductId};

/// Stock status of a catalog product.
///
/// Serialized with the storefront's wire names (`instock`, `outofstock`,
/// `onbackorder`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    #[default]
    InStock,
    OutOfStock,
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "instock",
            StockStatus::OutOfStock => "outofstock",
            StockStatus::OnBackorder => "onbackorder",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s.trim().to_lowercase().as_str() {
            "instock" | "in_stock" => Ok(StockStatus::InStock),
            "outofstock" | "out_of_stock" => Ok(StockStatus::OutOfStock),
            "onbackorder" | "on_backorder" => Ok(StockStatus::OnBackorder),
            other => Err(DomainError::validation(format!(
                "unknown stock status: {other:?} (expected instock, outofstock or onbackorder)"
            ))),
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who changed a product's stock status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    /// A merchant or the host platform edited the product.
    Manual,
    /// The scheduled out-of-stock sweep.
    Scheduled,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    stock_status: StockStatus,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            sku: String::new(),
            name: String::new(),
            stock_status: StockStatus::InStock,
            version: 0,
            created: false,
        }
    }

    /// Rebuild a product from persisted columns (storage adapters only).
    pub fn restore(
        id: ProductId,
        sku: String,
        name: String,
        stock_status: StockStatus,
        version: u64,
    ) -> Self {
        Self {
            id,
            sku,
            name,
            stock_status,
            version,
            created: true,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stock_status(&self) -> StockStatus {
        self.stock_status
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetStockStatus (manual edit, any direction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStockStatus {
    pub product_id: ProductId,
    pub stock_status: StockStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkOutOfStock (scheduled sweep, forward only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkOutOfStock {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    SetStockStatus(SetStockStatus),
    MarkOutOfStock(MarkOutOfStock),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStatusChanged {
    pub product_id: ProductId,
    pub from: StockStatus,
    pub to: StockStatus,
    pub source: ChangeSource,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    StockStatusChanged(StockStatusChanged),
}

impl ProductEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::StockStatusChanged(_) => "products.product.stock_status_changed",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::StockStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.stock_status = StockStatus::InStock;
                self.created = true;
            }
            ProductEvent::StockStatusChanged(e) => {
                self.stock_status = e.to;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::SetStockStatus(cmd) => self.handle_set_stock_status(cmd),
            ProductCommand::MarkOutOfStock(cmd) => self.handle_mark_out_of_stock(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            sku: cmd.sku.trim().to_string(),
            name: cmd.name.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_stock_status(
        &self,
        cmd: &SetStockStatus,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        if self.stock_status == cmd.stock_status {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::StockStatusChanged(StockStatusChanged {
            product_id: cmd.product_id,
            from: self.stock_status,
            to: cmd.stock_status,
            source: ChangeSource::Manual,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_out_of_stock(
        &self,
        cmd: &MarkOutOfStock,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        // Already out of stock: nothing to record.
        if self.stock_status == StockStatus::OutOfStock {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::StockStatusChanged(StockStatusChanged {
            product_id: cmd.product_id,
            from: self.stock_status,
            to: StockStatus::OutOfStock,
            source: ChangeSource::Scheduled,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_product(product_id: ProductId) -> Product {
        let mut product = Product::empty(product_id);
        let events = product
            .handle(&ProductCommand::CreateProduct(CreateProduct {
                product_id,
                sku: "SKU-001".to_string(),
                name: "Seasonal Tea".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            product.apply(e);
        }
        product
    }

    #[test]
    fn create_product_emits_product_created_event() {
        let product_id = ProductId::new();
        let product = Product::empty(product_id);
        let cmd = CreateProduct {
            product_id,
            sku: " SKU-001 ".to_string(),
            name: "Seasonal Tea".to_string(),
            occurred_at: test_time(),
        };

        let events = product.handle(&ProductCommand::CreateProduct(cmd)).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            ProductEvent::ProductCreated(e) => {
                assert_eq!(e.product_id, product_id);
                assert_eq!(e.sku, "SKU-001");
                assert_eq!(e.name, "Seasonal Tea");
            }
            _ => panic!("Expected ProductCreated event"),
        }
    }

    #[test]
    fn create_product_rejects_empty_name_and_sku() {
        let product_id = ProductId::new();
        let product = Product::empty(product_id);

        let err = product
            .handle(&ProductCommand::CreateProduct(CreateProduct {
                product_id,
                sku: "SKU-001".to_string(),
                name: "   ".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = product
            .handle(&ProductCommand::CreateProduct(CreateProduct {
                product_id,
                sku: "".to_string(),
                name: "Seasonal Tea".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_product_twice_conflicts() {
        let product_id = ProductId::new();
        let product = created_product(product_id);

        let err = product
            .handle(&ProductCommand::CreateProduct(CreateProduct {
                product_id,
                sku: "SKU-002".to_string(),
                name: "Other".to_string(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn new_products_are_in_stock() {
        let product = created_product(ProductId::new());
        assert_eq!(product.stock_status(), StockStatus::InStock);
        assert_eq!(product.version(), 1);
    }

    #[test]
    fn mark_out_of_stock_moves_status_forward() {
        let product_id = ProductId::new();
        let mut product = created_product(product_id);

        let events = product
            .handle(&ProductCommand::MarkOutOfStock(MarkOutOfStock {
                product_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ProductEvent::StockStatusChanged(e) => {
                assert_eq!(e.from, StockStatus::InStock);
                assert_eq!(e.to, StockStatus::OutOfStock);
                assert_eq!(e.source, ChangeSource::Scheduled);
            }
            _ => panic!("Expected StockStatusChanged event"),
        }

        product.apply(&events[0]);
        assert_eq!(product.stock_status(), StockStatus::OutOfStock);
        assert_eq!(product.version(), 2);
    }

    #[test]
    fn mark_out_of_stock_is_a_no_op_when_already_out() {
        let product_id = ProductId::new();
        let mut product = created_product(product_id);
        let cmd = ProductCommand::MarkOutOfStock(MarkOutOfStock {
            product_id,
            occurred_at: test_time(),
        });

        for e in product.handle(&cmd).unwrap() {
            product.apply(&e);
        }
        let version = product.version();

        let events = product.handle(&cmd).unwrap();
        assert!(events.is_empty());
        assert_eq!(product.version(), version);
    }

    #[test]
    fn mark_out_of_stock_covers_backorder() {
        let product_id = ProductId::new();
        let mut product = created_product(product_id);
        for e in product
            .handle(&ProductCommand::SetStockStatus(SetStockStatus {
                product_id,
                stock_status: StockStatus::OnBackorder,
                occurred_at: test_time(),
            }))
            .unwrap()
        {
            product.apply(&e);
        }

        let events = product
            .handle(&ProductCommand::MarkOutOfStock(MarkOutOfStock {
                product_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn manual_restock_is_allowed() {
        let product_id = ProductId::new();
        let mut product = created_product(product_id);
        for cmd in [
            ProductCommand::MarkOutOfStock(MarkOutOfStock {
                product_id,
                occurred_at: test_time(),
            }),
            ProductCommand::SetStockStatus(SetStockStatus {
                product_id,
                stock_status: StockStatus::InStock,
                occurred_at: test_time(),
            }),
        ] {
            for e in product.handle(&cmd).unwrap() {
                product.apply(&e);
            }
        }

        assert_eq!(product.stock_status(), StockStatus::InStock);
        assert_eq!(product.version(), 3);
    }

    #[test]
    fn commands_on_missing_product_are_not_found() {
        let product_id = ProductId::new();
        let product = Product::empty(product_id);

        let err = product
            .handle(&ProductCommand::MarkOutOfStock(MarkOutOfStock {
                product_id,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn commands_for_another_product_are_rejected() {
        let product = created_product(ProductId::new());

        let err = product
            .handle(&ProductCommand::MarkOutOfStock(MarkOutOfStock {
                product_id: ProductId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn stock_status_parses_wire_names() {
        assert_eq!(StockStatus::parse("outofstock").unwrap(), StockStatus::OutOfStock);
        assert_eq!(StockStatus::parse(" In_Stock ").unwrap(), StockStatus::InStock);
        assert!(StockStatus::parse("sold").is_err());
        assert_eq!(
            serde_json::to_string(&StockStatus::OnBackorder).unwrap(),
            "\"onbackorder\""
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = StockStatus> {
            prop_oneof![
                Just(StockStatus::InStock),
                Just(StockStatus::OutOfStock),
                Just(StockStatus::OnBackorder),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: after MarkOutOfStock the product is out of stock, and a
            /// second MarkOutOfStock changes nothing.
            #[test]
            fn mark_out_of_stock_is_idempotent(start in any_status()) {
                let product_id = ProductId::new();
                let mut product = Product::restore(
                    product_id,
                    "SKU".to_string(),
                    "Name".to_string(),
                    start,
                    1,
                );
                let cmd = ProductCommand::MarkOutOfStock(MarkOutOfStock {
                    product_id,
                    occurred_at: Utc::now(),
                });

                for e in product.handle(&cmd).unwrap() {
                    product.apply(&e);
                }
                let after_first = product.clone();

                prop_assert_eq!(product.stock_status(), StockStatus::OutOfStock);
                prop_assert!(product.handle(&cmd).unwrap().is_empty());
                prop_assert_eq!(after_first, product);
            }
        }
    }
}
