use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use stockdate_infra::{
    admin_form::AdminForm,
    catalog::{InMemoryProductCatalog, ProductCatalog},
    command_dispatcher::CommandDispatcher,
    config::AppConfig,
    directives::DirectiveRepository,
    form_token::FormTokenStore,
    jobs::{
        InMemoryJobStore, JobRunner, JobRunnerConfig, JobRunnerHandle, Registration,
        ensure_scheduled,
    },
    meta_store::{InMemoryMetaStore, MetaStore},
    reconciler::{Clock, DAILY_CHECK_HOOK, StockReconciler, SystemClock},
};

pub type SharedCatalog = Arc<dyn ProductCatalog>;
pub type SharedMeta = Arc<dyn MetaStore>;
pub type SharedClock = Arc<dyn Clock>;
pub type Reconciler = StockReconciler<SharedCatalog, SharedMeta, SharedClock>;

/// Everything the handlers need, wired once at startup.
pub struct AppServices {
    pub config: AppConfig,
    pub catalog: SharedCatalog,
    pub dispatcher: CommandDispatcher<SharedCatalog>,
    pub admin_form: AdminForm<SharedCatalog, SharedMeta>,
    pub reconciler: Arc<Reconciler>,
    pub jobs: Arc<InMemoryJobStore>,
}

impl AppServices {
    /// Wire services over the given stores.
    pub fn new(config: AppConfig, catalog: SharedCatalog, meta: SharedMeta, clock: SharedClock) -> Self {
        let tokens = Arc::new(FormTokenStore::new(config.token_ttl));
        let admin_form = AdminForm::new(
            catalog.clone(),
            DirectiveRepository::new(meta.clone()),
            tokens,
            config.date_input,
        );
        let reconciler = Arc::new(StockReconciler::new(
            catalog.clone(),
            DirectiveRepository::new(meta),
            clock,
        ));

        Self {
            config,
            dispatcher: CommandDispatcher::new(catalog.clone()),
            catalog,
            admin_form,
            reconciler,
            jobs: InMemoryJobStore::arc(),
        }
    }

    /// In-memory stores and the host clock.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryProductCatalog::new()),
            Arc::new(InMemoryMetaStore::new()),
            Arc::new(SystemClock),
        )
    }

    /// Register the daily sweep hook unless it is already scheduled.
    pub fn ensure_sweep_scheduled(&self) -> anyhow::Result<Registration> {
        let registration = ensure_scheduled(
            &self.jobs,
            DAILY_CHECK_HOOK,
            self.config.sweep_schedule,
            Utc::now(),
        )
        .context("failed to schedule stock sweep")?;

        if let Registration::Created(job) = &registration {
            info!(
                job_id = %job.id,
                hook = %job.hook,
                next_run_at = %job.next_run_at,
                "stock sweep scheduled"
            );
        }
        Ok(registration)
    }

    /// Start the background job runner with the sweep handler registered.
    ///
    /// Must be called from inside a tokio runtime: the handler re-enters it so
    /// database-backed stores can run their queries from the runner thread.
    pub fn spawn_job_runner(&self) -> anyhow::Result<JobRunnerHandle> {
        let runtime = tokio::runtime::Handle::current();
        let reconciler = self.reconciler.clone();

        let mut runner = JobRunner::new(self.jobs.clone());
        runner.register_handler(DAILY_CHECK_HOOK, move |job| {
            let _guard = runtime.enter();
            reconciler.run_as_job(job)
        });

        runner
            .spawn(
                JobRunnerConfig::default()
                    .with_name("stock-sweep-runner")
                    .with_poll_interval(self.config.poll_interval),
            )
            .context("failed to spawn job runner")
    }
}

/// Build services for a configuration: Postgres when `DATABASE_URL` is set
/// (and the `postgres` feature is enabled), in-memory otherwise.
pub async fn build_services(config: AppConfig) -> anyhow::Result<AppServices> {
    match config.database_url.clone() {
        Some(url) => postgres_services(config, &url).await,
        None => {
            info!("using in-memory stores");
            Ok(AppServices::in_memory(config))
        }
    }
}

#[cfg(feature = "postgres")]
async fn postgres_services(config: AppConfig, url: &str) -> anyhow::Result<AppServices> {
    use stockdate_infra::{
        catalog::PostgresProductCatalog, meta_store::PostgresMetaStore, pg,
    };

    let pool = pg::connect(url)
        .await
        .context("failed to connect to postgres")?;
    info!("using postgres stores");

    Ok(AppServices::new(
        config,
        Arc::new(PostgresProductCatalog::new(pool.clone())),
        Arc::new(PostgresMetaStore::new(pool)),
        Arc::new(SystemClock),
    ))
}

#[cfg(not(feature = "postgres"))]
async fn postgres_services(_config: AppConfig, _url: &str) -> anyhow::Result<AppServices> {
    anyhow::bail!("DATABASE_URL is set but this build has no postgres support (enable the `postgres` feature)")
}
