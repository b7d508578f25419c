use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use storefront_catalog::{Database, NewProduct, Repository};
use storefront_config::Config;
use storefront_images::{Context, PruneEvent};
use storefront_server::AppState;
use storefront_storage::BackendHandle;
use storefront_storage::backend::{LocalBackend, StorageBackend};

/// Open the catalog database and the image directory described by `config`.
async fn open(config: &Config) -> Result<(Database, BackendHandle)> {
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Database)?;
    let backend = LocalBackend::new("local", &config.images.directory).or_raise(|| ErrorKind::Storage)?;
    backend.ensure_root().await.or_raise(|| ErrorKind::Storage)?;
    Ok((db, Arc::new(backend)))
}

pub(crate) async fn serve(config: &Config) -> Result<()> {
    let (db, backend) = open(config).await?;
    tracing::info!(
        database = %config.database.path.display(),
        images = %config.images.directory.display(),
        retention = ?config.images.retention,
        "starting storefront"
    );
    let state = AppState {
        backend,
        catalog: Repository::from(&db),
        images: Arc::new(Context::from(&config.images)),
    };
    let result =
        storefront_server::serve(state, &config.server, shutdown_signal()).await.or_raise(|| ErrorKind::Server);
    db.close().await;
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "could not listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

/// Parse a JSON array of products.
pub(crate) fn read_products(path: &Path) -> Result<Vec<NewProduct>> {
    let data = std::fs::read(path).or_raise(|| ErrorKind::Import)?;
    serde_json::from_slice(&data).or_raise(|| ErrorKind::Import)
}

pub(crate) async fn import(config: &Config, path: &Path) -> Result<()> {
    let products = read_products(path)?;
    let db = Database::connect(&config.database.path).await.or_raise(|| ErrorKind::Database)?;
    let catalog = Repository::from(&db);
    for product in &products {
        let stored = catalog.insert(product).await.or_raise(|| ErrorKind::Import)?;
        println!("{:>6}  {}", stored.id, stored.name);
    }
    tracing::info!(count = products.len(), path = %path.display(), "imported products");
    db.close().await;
    Ok(())
}

pub(crate) async fn prune(config: &Config, dry_run: bool) -> Result<()> {
    let (db, backend) = open(config).await?;
    let catalog = Repository::from(&db);
    let mut events = std::pin::pin!(storefront_images::prune(&backend, &catalog, dry_run));
    let (mut removed, mut kept, mut failed) = (0u64, 0u64, 0u64);
    let verb = if dry_run { "would remove" } else { "removed" };
    let mut outcome = Ok(());
    while let Some(event) = events.next().await {
        match event {
            Ok(PruneEvent::Started) => tracing::debug!(dry_run, "pruning orphaned images"),
            Ok(PruneEvent::DiscoveryComplete(total)) => tracing::info!(total, "listed image directory"),
            Ok(PruneEvent::Removed(file)) => {
                removed += 1;
                println!("{verb} {} ({} bytes)", file.name, file.size);
            },
            Ok(PruneEvent::Kept(_)) => kept += 1,
            Ok(PruneEvent::Complete) => (),
            Err(e) => {
                failed += 1;
                tracing::error!(error = ?e, "prune step failed");
                outcome = Err(e).or_raise(|| ErrorKind::Prune);
            },
        }
    }
    println!("{removed} {verb}, {kept} kept, {failed} failed");
    db.close().await;
    outcome
}
