use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, TryStreamExt};
use std::collections::HashSet;
use storefront_catalog::Repository;
use storefront_storage::{BackendHandle, FileInfo};

/// Progress events emitted by [`prune`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of stored files.
/// 3. [`Removed`](Self::Removed) or [`Kept`](Self::Kept): once per file.
/// 4. [`Complete`](Self::Complete): exactly once.
///
/// A discovery failure ends the stream early, without
/// [`Complete`](Self::Complete).
#[derive(Debug, Clone, PartialEq)]
pub enum PruneEvent {
    Started,
    DiscoveryComplete(u64),
    /// No product refers to the file; it was deleted (or would have been,
    /// during a dry run).
    Removed(FileInfo),
    /// A product still refers to the file.
    Kept(FileInfo),
    Complete,
}

/// Streams [`PruneEvent`]s while deleting every stored image that no product
/// refers to.
///
/// Files written by uploads for unknown products, uploads whose association
/// failed, and files superseded under the `keep` retention policy all end up
/// here. With `dry_run` nothing is deleted.
///
/// Individual delete failures are surfaced as `Err` items without
/// terminating the stream.
pub fn prune<'a>(
    backend: &'a BackendHandle,
    catalog: &'a Repository,
    dry_run: bool,
) -> impl Stream<Item = Result<PruneEvent>> + 'a {
    stream! {
        for await event in prune_inner(backend, catalog, dry_run) {
            yield event.or_raise(|| ErrorKind::Prune);
        }
    }
}

fn prune_inner<'a>(
    backend: &'a BackendHandle,
    catalog: &'a Repository,
    dry_run: bool,
) -> impl Stream<Item = Result<PruneEvent>> + 'a {
    stream!({
        yield Ok(PruneEvent::Started);

        // Matched on the stored name alone, so a directory reached through a
        // different spelling of its path still counts as referenced.
        let referenced: HashSet<String> = match catalog.referenced_images().await.or_raise(|| ErrorKind::Catalog) {
            Ok(paths) => paths
                .iter()
                .filter_map(|path| path.file_name()?.to_str())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let listing = backend.list_stream().try_collect::<Vec<_>>().await;
        let files: Vec<FileInfo> = match listing.or_raise(|| ErrorKind::StorageUnavailable) {
            Ok(f) => f,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(PruneEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(u64::MAX)));

        for file in files {
            if referenced.contains(&file.name) {
                yield Ok(PruneEvent::Kept(file));
                continue;
            }
            if !dry_run {
                match backend.delete(&file.name).await.or_raise(|| ErrorKind::StorageUnavailable) {
                    Ok(()) => tracing::info!(name = %file.name, bytes = file.size, "removed orphaned image"),
                    Err(e) => {
                        yield Err(e);
                        continue;
                    },
                }
            }
            yield Ok(PruneEvent::Removed(file));
        }

        yield Ok(PruneEvent::Complete);
    })
}
