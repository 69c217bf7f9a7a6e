use super::traits::{HandlerExecutor, NotificationPublisher};
use courier_core::{CancellationToken, PublishError};

/// A sequential notification publisher.
///
/// Awaits handlers one by one in registration order. The first failure stops
/// the publish; later handlers never run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialPublisher;

impl NotificationPublisher for SequentialPublisher {
    async fn publish<'a>(
        &'a self,
        executors: Vec<HandlerExecutor<'a>>,
        cancel: CancellationToken,
    ) -> Result<(), PublishError> {
        for executor in executors {
            executor(cancel.clone()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::BoxError;
    use futures::future::BoxFuture;
    use std::sync::{Arc, Mutex};

    fn executor<'a>(log: Arc<Mutex<Vec<usize>>>, id: usize, fail: bool) -> HandlerExecutor<'a> {
        Box::new(move |_cancel: CancellationToken| -> BoxFuture<'a, Result<(), BoxError>> {
            Box::pin(async move {
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
    async fn test_failure_stops_remaining_handlers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let executors = vec![
            executor(log.clone(), 1, false),
            executor(log.clone(), 2, true),
            executor(log.clone(), 3, false),
        ];

        let error = SequentialPublisher
            .publish(executors, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "handler 2 failed");
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_publish_succeeds() {
        assert!(
            SequentialPublisher
                .publish(Vec::new(), CancellationToken::new())
                .await
                .is_ok()
        );
    }
}
