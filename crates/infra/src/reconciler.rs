//! Daily stock sweep.
//!
//! Walks the whole catalog, evaluates each product's directive against
//! today's date and marks due products out of stock. Each product is an
//! independent update; one failing product does not stop the sweep.

use std::sync::RwLock;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use stockdate_core::ProductId;
use stockdate_products::{DirectiveDecision, MarkOutOfStock, ProductCommand};

use crate::catalog::{CatalogError, ProductCatalog};
use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::directives::DirectiveRepository;
use crate::jobs::{JobResult, ScheduledJob};
use crate::meta_store::MetaStore;

/// Hook name of the daily sweep job.
pub const DAILY_CHECK_HOOK: &str = "custom_stock_management_daily_check";

/// Source of "today" for the sweep.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<K: Clock + ?Sized> Clock for std::sync::Arc<K> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Host local clock. No timezone normalization is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    today: RwLock<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: RwLock::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        match self.today.write() {
            Ok(mut d) => *d = today,
            Err(poisoned) => *poisoned.into_inner() = today,
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.today.read() {
            Ok(d) => *d,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Counters from one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub today: Option<NaiveDate>,
    pub scanned: usize,
    pub disabled: usize,
    pub no_target_date: usize,
    pub not_yet_due: usize,
    pub marked_out_of_stock: usize,
    pub already_out_of_stock: usize,
    /// Enumerated but gone by the time it was updated.
    pub missing: usize,
    pub failed: usize,
}

/// The stock reconciler.
pub struct StockReconciler<C, M, K> {
    dispatcher: CommandDispatcher<C>,
    directives: DirectiveRepository<M>,
    clock: K,
}

impl<C, M, K> StockReconciler<C, M, K>
where
    C: ProductCatalog,
    M: MetaStore,
    K: Clock,
{
    pub fn new(catalog: C, directives: DirectiveRepository<M>, clock: K) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(catalog),
            directives,
            clock,
        }
    }

    /// Run one sweep over the catalog.
    ///
    /// Only a failure to enumerate the catalog aborts the sweep; per-product
    /// failures are logged and counted.
    pub fn sweep(&self) -> Result<SweepReport, CatalogError> {
        let today = self.clock.today();
        let ids = self.dispatcher.catalog().list_ids()?;
        let mut report = SweepReport {
            today: Some(today),
            ..SweepReport::default()
        };

        for product_id in ids {
            report.scanned += 1;
            self.reconcile_one(product_id, today, &mut report);
        }

        info!(
            today = %today,
            scanned = report.scanned,
            marked = report.marked_out_of_stock,
            failed = report.failed,
            "stock sweep finished"
        );
        Ok(report)
    }

    fn reconcile_one(&self, product_id: ProductId, today: NaiveDate, report: &mut SweepReport) {
        let directive = match self.directives.read(product_id) {
            Ok(d) => d,
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "failed to read stock schedule");
                report.failed += 1;
                return;
            }
        };

        match directive.evaluate(today) {
            DirectiveDecision::Disabled => report.disabled += 1,
            DirectiveDecision::NoTargetDate => report.no_target_date += 1,
            DirectiveDecision::NotYetDue => report.not_yet_due += 1,
            DirectiveDecision::Due => {
                let command = ProductCommand::MarkOutOfStock(MarkOutOfStock {
                    product_id,
                    occurred_at: self.clock.now(),
                });
                match self.dispatcher.dispatch(product_id, command) {
                    Ok(events) if events.is_empty() => report.already_out_of_stock += 1,
                    Ok(_) => {
                        info!(product_id = %product_id, "product marked out of stock");
                        report.marked_out_of_stock += 1;
                    }
                    Err(DispatchError::NotFound) => {
                        debug!(product_id = %product_id, "product vanished during sweep");
                        report.missing += 1;
                    }
                    Err(e) => {
                        warn!(product_id = %product_id, error = %e, "failed to mark out of stock");
                        report.failed += 1;
                    }
                }
            }
        }
    }

    /// Adapter for the job runner.
    pub fn run_as_job(&self, job: &ScheduledJob) -> JobResult {
        debug!(job_id = %job.id, hook = %job.hook, "stock sweep triggered");
        match self.sweep() {
            Ok(_) => JobResult::Success,
            Err(e) => JobResult::Failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use stockdate_products::{Product, StockDirective, StockStatus, TargetDate};

    use crate::catalog::InMemoryProductCatalog;
    use crate::meta_store::{InMemoryMetaStore, MetaStoreError};

    type TestReconciler =
        StockReconciler<Arc<InMemoryProductCatalog>, Arc<InMemoryMetaStore>, Arc<FixedClock>>;

    struct Fixture {
        catalog: Arc<InMemoryProductCatalog>,
        directives: DirectiveRepository<Arc<InMemoryMetaStore>>,
        clock: Arc<FixedClock>,
        reconciler: TestReconciler,
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture(today: &str) -> Fixture {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let meta = Arc::new(InMemoryMetaStore::new());
        let clock = Arc::new(FixedClock::new(day(today)));
        let reconciler = StockReconciler::new(
            catalog.clone(),
            DirectiveRepository::new(meta.clone()),
            clock.clone(),
        );
        Fixture {
            catalog,
            directives: DirectiveRepository::new(meta),
            clock,
            reconciler,
        }
    }

    impl Fixture {
        fn product(&self, target: &str, enabled: bool) -> ProductId {
            let id = ProductId::new();
            self.catalog
                .save(&Product::restore(
                    id,
                    format!("SKU-{id}"),
                    "Product".to_string(),
                    StockStatus::InStock,
                    1,
                ))
                .unwrap();
            self.directives
                .write(id, &StockDirective::new(TargetDate::new(target), enabled))
                .unwrap();
            id
        }

        fn status(&self, id: ProductId) -> StockStatus {
            self.catalog.load(id).unwrap().unwrap().stock_status()
        }
    }

    #[test]
    fn scenario_a_due_today_goes_out_of_stock() {
        let f = fixture("2024-01-01");
        let p1 = f.product("2024-01-01", true);

        let report = f.reconciler.sweep().unwrap();

        assert_eq!(f.status(p1), StockStatus::OutOfStock);
        assert_eq!(report.marked_out_of_stock, 1);
    }

    #[test]
    fn scenario_b_future_date_is_untouched() {
        let f = fixture("2024-06-01");
        let p2 = f.product("2099-01-01", true);

        let report = f.reconciler.sweep().unwrap();

        assert_eq!(f.status(p2), StockStatus::InStock);
        assert_eq!(report.not_yet_due, 1);
    }

    #[test]
    fn scenario_c_disabled_is_untouched() {
        let f = fixture("2024-06-01");
        let p3 = f.product("2024-01-01", false);

        let report = f.reconciler.sweep().unwrap();

        assert_eq!(f.status(p3), StockStatus::InStock);
        assert_eq!(report.disabled, 1);
    }

    #[test]
    fn scenario_d_empty_date_is_untouched() {
        let f = fixture("2024-06-01");
        let p4 = f.product("", true);

        let report = f.reconciler.sweep().unwrap();

        assert_eq!(f.status(p4), StockStatus::InStock);
        assert_eq!(report.no_target_date, 1);
    }

    #[test]
    fn products_without_directive_are_untouched() {
        let f = fixture("2024-06-01");
        let id = ProductId::new();
        f.catalog
            .save(&Product::restore(id, "S".into(), "N".into(), StockStatus::InStock, 1))
            .unwrap();

        f.reconciler.sweep().unwrap();
        assert_eq!(f.status(id), StockStatus::InStock);
    }

    #[test]
    fn sweep_is_idempotent() {
        let f = fixture("2024-06-01");
        let due = f.product("2024-05-01", true);
        let later = f.product("2024-07-01", true);

        let first = f.reconciler.sweep().unwrap();
        let version = f.catalog.load(due).unwrap().unwrap();
        let second = f.reconciler.sweep().unwrap();

        assert_eq!(first.marked_out_of_stock, 1);
        assert_eq!(second.marked_out_of_stock, 0);
        assert_eq!(second.already_out_of_stock, 1);
        assert_eq!(f.catalog.load(due).unwrap().unwrap(), version);
        assert_eq!(f.status(later), StockStatus::InStock);
    }

    #[test]
    fn late_sweep_still_catches_up() {
        let f = fixture("2024-06-01");
        let id = f.product("2024-06-03", true);

        f.reconciler.sweep().unwrap();
        assert_eq!(f.status(id), StockStatus::InStock);

        // Two missed days; the predicate is still true when the sweep finally runs.
        f.clock.set(day("2024-06-05"));
        f.reconciler.sweep().unwrap();
        assert_eq!(f.status(id), StockStatus::OutOfStock);
    }

    #[test]
    fn never_restocks_products() {
        let f = fixture("2024-06-01");
        let id = f.product("2099-01-01", true);
        f.catalog
            .save(&Product::restore(id, "S".into(), "N".into(), StockStatus::OutOfStock, 2))
            .unwrap();

        f.reconciler.sweep().unwrap();
        assert_eq!(f.status(id), StockStatus::OutOfStock);
    }

    struct FailingMeta;

    impl MetaStore for FailingMeta {
        fn get_meta(&self, _: ProductId, _: &str) -> Result<Option<String>, MetaStoreError> {
            Err(MetaStoreError::Storage("down".to_string()))
        }

        fn update_meta(&self, _: ProductId, _: &str, _: &str) -> Result<(), MetaStoreError> {
            Err(MetaStoreError::Storage("down".to_string()))
        }
    }

    #[test]
    fn per_product_failures_are_counted_not_fatal() {
        let catalog = Arc::new(InMemoryProductCatalog::new());
        for _ in 0..3 {
            catalog
                .save(&Product::restore(
                    ProductId::new(),
                    "S".into(),
                    "N".into(),
                    StockStatus::InStock,
                    1,
                ))
                .unwrap();
        }
        let reconciler = StockReconciler::new(
            catalog,
            DirectiveRepository::new(FailingMeta),
            FixedClock::new(day("2024-06-01")),
        );

        let report = reconciler.sweep().unwrap();
        assert_eq!(report.scanned, 3);
        assert_eq!(report.failed, 3);
    }

    /// Lists one id more than it can load, as when a product is deleted
    /// between enumeration and update.
    struct VanishingCatalog {
        inner: InMemoryProductCatalog,
        ghost: ProductId,
        saves: std::sync::Mutex<Vec<ProductId>>,
    }

    impl ProductCatalog for VanishingCatalog {
        fn list_ids(&self) -> Result<Vec<ProductId>, CatalogError> {
            let mut ids = self.inner.list_ids()?;
            ids.insert(0, self.ghost);
            Ok(ids)
        }

        fn load(&self, product_id: ProductId) -> Result<Option<Product>, CatalogError> {
            self.inner.load(product_id)
        }

        fn save(&self, product: &Product) -> Result<(), CatalogError> {
            self.saves.lock().unwrap().push(product.id_typed());
            self.inner.save(product)
        }
    }

    #[test]
    fn vanished_products_are_counted_missing() {
        let ghost = ProductId::new();
        let real = ProductId::new();
        let catalog = Arc::new(VanishingCatalog {
            inner: InMemoryProductCatalog::new(),
            ghost,
            saves: std::sync::Mutex::new(Vec::new()),
        });
        catalog
            .inner
            .save(&Product::restore(real, "S".into(), "N".into(), StockStatus::InStock, 1))
            .unwrap();

        let meta = Arc::new(InMemoryMetaStore::new());
        let directives = DirectiveRepository::new(meta.clone());
        for id in [ghost, real] {
            directives
                .write(id, &StockDirective::new(TargetDate::new("2024-01-01"), true))
                .unwrap();
        }
        let reconciler = StockReconciler::new(
            catalog.clone(),
            DirectiveRepository::new(meta),
            FixedClock::new(day("2024-06-01")),
        );

        let report = reconciler.sweep().unwrap();

        assert_eq!(report.scanned, 2);
        assert_eq!(report.missing, 1);
        assert_eq!(report.marked_out_of_stock, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(*catalog.saves.lock().unwrap(), vec![real]);
        assert_eq!(
            catalog.load(real).unwrap().unwrap().stock_status(),
            StockStatus::OutOfStock
        );
        assert!(catalog.load(ghost).unwrap().is_none());
    }

    #[test]
    fn job_adapter_reports_success() {
        let f = fixture("2024-01-01");
        f.product("2024-01-01", true);
        let job = ScheduledJob::new(DAILY_CHECK_HOOK, crate::jobs::Recurrence::Daily, Utc::now());
        assert_eq!(f.reconciler.run_as_job(&job), JobResult::Success);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_day() -> impl Strategy<Value = NaiveDate> {
            (2000i32..2100, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: out of stock after a sweep iff enabled, dated and due.
            #[test]
            fn sweep_matches_predicate(
                target in prop::option::of(any_day()),
                enabled in any::<bool>(),
                today in any_day(),
            ) {
                let f = fixture("2000-01-01");
                f.clock.set(today);
                let text = target.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
                let id = f.product(&text, enabled);

                f.reconciler.sweep().unwrap();
                let after_first = f.status(id);
                f.reconciler.sweep().unwrap();

                let expected = enabled && target.is_some_and(|t| today >= t);
                prop_assert_eq!(after_first == StockStatus::OutOfStock, expected);
                prop_assert_eq!(f.status(id), after_first);
            }
        }
    }
}
