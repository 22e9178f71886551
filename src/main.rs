//! paygate - micro-deposit verification service
//!
//! ```text
//! public router ──▶ workflow ──▶ micro_deposits ──▶ merge sweep ──▶ outbound/
//!                      │               ▲
//!                      ▼               │
//!               ACH + ledger      admin router
//! ```
//!
//! Usage: `paygate --env dev`

use std::sync::Arc;
use std::time::Duration;

use paygate::clients::{AccountsClient, AchClient, HttpAccountsClient, HttpAchClient};
use paygate::config::AppConfig;
use paygate::db::{Database, schema};
use paygate::depository::PgDepositoryRepository;
use paygate::events::PgEventRepository;
use paygate::gateway::{self, state::AppState};
use paygate::micro_deposit::{
    DirectoryMerger, LedgerPoster, MergeSweep, MicroDepositStore, OdfiAccount,
    PgMicroDepositRepository, VerificationWorkflow,
};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = paygate::logging::init_logging(&app_config);

    tracing::info!("Starting paygate in {} mode", env);

    let db = Arc::new(Database::connect(&app_config.postgres_url).await?);
    schema::init_schema(db.pool()).await?;

    let ach: Arc<dyn AchClient> = Arc::new(HttpAchClient::new(
        app_config.ach.endpoint.clone(),
        Duration::from_secs(app_config.ach.timeout_secs),
    )?);

    let accounts: Option<Arc<dyn AccountsClient>> = if app_config.accounts.enabled {
        tracing::info!("Ledger postings enabled: {}", app_config.accounts.endpoint);
        Some(Arc::new(HttpAccountsClient::new(
            app_config.accounts.endpoint.clone(),
            Duration::from_secs(app_config.accounts.timeout_secs),
        )?))
    } else {
        tracing::info!("Ledger postings disabled");
        None
    };

    let odfi = Arc::new(OdfiAccount::new(&app_config.odfi, accounts.clone()));
    let ledger = accounts.map(|client| LedgerPoster::new(client, odfi.clone()));

    let store = MicroDepositStore::new(Arc::new(PgMicroDepositRepository::new(
        db.pool().clone(),
    )));
    let workflow = Arc::new(VerificationWorkflow::new(
        Arc::new(PgDepositoryRepository::new(db.pool().clone())),
        store.clone(),
        ach.clone(),
        Arc::new(PgEventRepository::new(db.pool().clone())),
        odfi,
        ledger,
    ));

    let merge = &app_config.merge;
    if merge.enabled {
        tokio::fs::create_dir_all(&merge.outbound_dir).await?;
        let merger = Arc::new(DirectoryMerger::new(
            ach,
            merge.outbound_dir.clone(),
            app_config.odfi.routing_number.clone(),
        ));
        let sweep = MergeSweep::new(
            store,
            merger,
            merge.batch_size,
            Duration::from_secs(merge.interval_secs),
        );
        tokio::spawn(async move { sweep.run().await });
    } else {
        tracing::info!("Merge sweep disabled");
    }

    let state = Arc::new(AppState::new(workflow, Some(db)));
    let public_addr = app_config.http.addr();
    let admin_addr = app_config.admin.addr();
    tokio::try_join!(
        gateway::serve(
            "public",
            &public_addr,
            gateway::public_router(state.clone())
        ),
        gateway::serve(
            "admin",
            &admin_addr,
            gateway::admin_router(state)
        ),
    )?;

    Ok(())
}
