use super::traits::{HandlerExecutor, NotificationPublisher};
use courier_core::{BoxError, CancellationToken, PublishError};
use futures::future::join_all;

/// A concurrent notification publisher.
///
/// Starts every handler, then waits for all of them. A failure never stops
/// the others: a single failure is returned as [`PublishError::Handler`],
/// several as [`PublishError::Aggregate`] in registration order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcurrentPublisher;

impl NotificationPublisher for ConcurrentPublisher {
    async fn publish<'a>(
        &'a self,
        executors: Vec<HandlerExecutor<'a>>,
        cancel: CancellationToken,
    ) -> Result<(), PublishError> {
        let results = join_all(
            executors
                .into_iter()
                .map(|executor| executor(cancel.clone())),
        )
        .await;

        let mut failures: Vec<BoxError> = results.into_iter().filter_map(Result::err).collect();
        match failures.len() {
            0 => Ok(()),
            1 => Err(PublishError::Handler(failures.remove(0))),
            _ => Err(PublishError::Aggregate(failures)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    fn executor<'a>(
        log: Arc<Mutex<Vec<usize>>>,
        id: usize,
        delay_ms: u64,
        fail: bool,
    ) -> HandlerExecutor<'a> {
        Box::new(move |_cancel: CancellationToken| -> BoxFuture<'a, Result<(), BoxError>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                log.lock().unwrap().push(id);
                if fail {
                    Err(BoxError::from(format!("handler {id} failed")))
                } else {
                    Ok(())
                }
            })
        })
    }

    #[tokio::test]
    async fn test_all_handlers_run_despite_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let executors = vec![
            executor(log.clone(), 1, 10, false),
            executor(log.clone(), 2, 0, true),
            executor(log.clone(), 3, 5, false),
        ];

        let error = ConcurrentPublisher
            .publish(executors, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(error, PublishError::Handler(_)));
        assert_eq!(error.to_string(), "handler 2 failed");
        let mut seen = log.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_several_failures_are_aggregated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let executors = vec![
            executor(log.clone(), 1, 0, true),
            executor(log.clone(), 2, 0, false),
            executor(log.clone(), 3, 0, true),
        ];

        let error = ConcurrentPublisher
            .publish(executors, CancellationToken::new())
            .await
            .unwrap_err();

        let messages: Vec<String> = error.failures().iter().map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["handler 1 failed", "handler 3 failed"]);
    }

    #[tokio::test]
    async fn test_handlers_overlap() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let executors = vec![
            executor(log.clone(), 1, 30, false),
            executor(log.clone(), 2, 0, false),
        ];

        ConcurrentPublisher
            .publish(executors, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*log.lock().unwrap(), vec![2, 1]);
    }
}
