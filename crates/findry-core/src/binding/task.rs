// ── Param watch task ──
//
// Background task re-evaluating a binding when its watched param sources
// change: subscribe, push an initial evaluation, then forward every change
// until cancelled.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{FindBinding, ParamsInput, WatchTarget};
use crate::model::Keyed;
use crate::remote::RemoteCollection;

/// Spawn the watch loop for `binding`.
///
/// Runs an initial `evaluate` when any param source is bound. When none is
/// bound and the binding is not local, logs a warning once -- the binding is
/// then display-only until params arrive. Shuts down on cancellation or when
/// the binding is dropped.
pub fn spawn_watch_task<T, R>(
    binding: Arc<FindBinding<T, R>>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    T: Keyed + Clone + Serialize + Send + Sync + 'static,
    R: RemoteCollection<T> + 'static,
{
    tokio::spawn(watch_loop(binding, cancel))
}

async fn watch_loop<T, R>(binding: Arc<FindBinding<T, R>>, cancel: CancellationToken)
where
    T: Keyed + Clone + Serialize + Send + Sync + 'static,
    R: RemoteCollection<T> + 'static,
{
    let mut params_rx = binding.params_rx();
    let mut fetch_rx = binding.fetch_params_rx();

    let has_source = params_rx.borrow().is_set() || fetch_rx.borrow().is_set();
    if has_source {
        if let Err(error) = binding.evaluate(ParamsInput::Unset).await {
            warn!(
                service = %binding.config().service,
                %error,
                "initial find failed"
            );
        }
    } else if !binding.config().local {
        warn!(
            service = %binding.config().service,
            params = %binding.names().params,
            fetch_params = %binding.names().fetch_params,
            "no bound params for find binding; no queries will be made \
             (set local: true for local-only bindings)"
        );
    }

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = params_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if binding.watches(WatchTarget::Params) {
                    if let Err(error) = binding.evaluate(ParamsInput::Unset).await {
                        warn!(
                            service = %binding.config().service,
                            %error,
                            "find after params change failed"
                        );
                    }
                }
            }

            changed = fetch_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if binding.watches(WatchTarget::FetchParams) {
                    if let Err(error) = binding.evaluate(ParamsInput::Unset).await {
                        warn!(
                            service = %binding.config().service,
                            %error,
                            "find after fetch params change failed"
                        );
                    }
                }
            }
        }
    }

    debug!(service = %binding.config().service, "find binding watch task shut down");
}
