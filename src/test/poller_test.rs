#[cfg(test)]
pub mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    use crate::configs::settings::ModelInput;
    use crate::cores::errors::RelayError;
    use crate::cores::predictions::client::PredictionApi;
    use crate::cores::predictions::poller::{PollPolicy, Poller};
    use crate::cores::schemas::{CreatePrediction, JobStatus, Prediction, UpscaleInput};
    use crate::cores::upscale_models::realesrgan::RealEsrgan;
    use crate::apis::upscale_api::upscale::run_model;
    use crate::cores::upscale_models::upscale_controller::Upscaler;
    use crate::test::support::{fast_policy, ScriptedPredictions};

    fn upscaler(api: Arc<ScriptedPredictions>) -> RealEsrgan {
        RealEsrgan::new(api, "v-test".to_string(), ModelInput::default(), Poller::new(fast_policy()))
    }

    async fn submit(api: &ScriptedPredictions) -> Prediction {
        let request = CreatePrediction {
            version: "v-test".to_string(),
            input: UpscaleInput::new("https://example.com/cat.png", &ModelInput::default()),
        };
        api.create(&request).await.unwrap()
    }

    #[actix_rt::test]
    async fn test_pending_processing_succeeded_returns_output_unchanged() {
        let api = ScriptedPredictions::new(vec![JobStatus::Starting, JobStatus::Processing, JobStatus::Succeeded])
            .with_output(json!("https://replicate.delivery/out.png"));
        let created = submit(&api).await;

        let finished = Poller::new(fast_policy())
            .wait_for_terminal(&api, created, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(finished.status, JobStatus::Succeeded);
        assert_eq!(finished.output, Some(json!("https://replicate.delivery/out.png")));
        assert_eq!(finished.artifacts().unwrap(), vec!["https://replicate.delivery/out.png"]);
        assert_eq!(api.polls_for(&finished.id), 3);
        assert!(api.cancelled.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_failed_job_surfaces_error_text() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing, JobStatus::Failed])
            .with_error("Input image is too large");
        let created = submit(&api).await;

        let err = Poller::new(fast_policy())
            .wait_for_terminal(&api, created, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            RelayError::JobFailed(text) => assert_eq!(text, "Input image is too large"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_canceled_job_is_a_failure() {
        let api = ScriptedPredictions::new(vec![JobStatus::Canceled]);
        let created = submit(&api).await;

        let err = Poller::new(fast_policy())
            .wait_for_terminal(&api, created, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::JobFailed(_)));
    }

    #[actix_rt::test]
    async fn test_terminal_creation_response_is_not_polled() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing]);
        let created = Prediction {
            id: "done".to_string(),
            status: JobStatus::Succeeded,
            output: Some(json!(["https://cdn.example.com/a.png"])),
            error: None,
        };

        let finished = Poller::new(fast_policy())
            .wait_for_terminal(&api, created, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(finished.id, "done");
        assert!(api.polled.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_stuck_job_stops_at_attempt_cap_and_cancels_upstream() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing]);
        let created = submit(&api).await;
        let policy = PollPolicy { max_attempts: 3, ..fast_policy() };

        let err = Poller::new(policy)
            .wait_for_terminal(&api, created.clone(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Timeout { attempts: 3, .. }));
        assert_eq!(api.polls_for(&created.id), 3);
        assert_eq!(*api.cancelled.lock().unwrap(), vec![created.id]);
    }

    #[actix_rt::test]
    async fn test_stuck_job_stops_at_deadline() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing]);
        let created = submit(&api).await;
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(5),
            max_attempts: u32::MAX,
            timeout: Duration::from_millis(40),
            ..fast_policy()
        };

        let err = Poller::new(policy)
            .wait_for_terminal(&api, created.clone(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            RelayError::Timeout { elapsed, .. } => assert!(elapsed >= Duration::from_millis(40)),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(*api.cancelled.lock().unwrap(), vec![created.id]);
    }

    #[actix_rt::test]
    async fn test_cancellation_stops_polling() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing]);
        let created = submit(&api).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = Poller::new(fast_policy())
            .wait_for_terminal(&api, created.clone(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::Cancelled));
        assert!(api.polled.lock().unwrap().is_empty());
        assert_eq!(*api.cancelled.lock().unwrap(), vec![created.id]);
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(1000),
            max_interval: Duration::from_millis(2000),
            backoff_factor: 1.5,
            ..PollPolicy::default()
        };
        let second = policy.next_interval(policy.initial_interval);
        assert_eq!(second, Duration::from_millis(1500));
        assert_eq!(policy.next_interval(second), Duration::from_millis(2000));
        assert_eq!(policy.next_interval(Duration::from_millis(2000)), Duration::from_millis(2000));
    }

    #[actix_rt::test]
    async fn test_upscale_sends_configured_input() {
        let api = Arc::new(ScriptedPredictions::new(vec![JobStatus::Succeeded]));
        let outcome = upscaler(api.clone())
            .upscale("https://example.com/cat.png", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.prediction_id, "job-1");
        assert_eq!(outcome.artifacts, vec!["https://cdn.example.com/job-1.png"]);
        let created = api.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].version, "v-test");
        assert_eq!(created[0].input, UpscaleInput {
            img: "https://example.com/cat.png".to_string(),
            version: "General - v3".to_string(),
            scale: 4,
            tile: 0,
            face_enhance: false,
        });
    }

    #[actix_rt::test]
    async fn test_upscale_normalizes_array_output() {
        let api = Arc::new(
            ScriptedPredictions::new(vec![JobStatus::Processing, JobStatus::Succeeded])
                .with_output(json!(["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"])),
        );
        let outcome = upscaler(api)
            .upscale("https://example.com/cat.png", CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.artifacts, vec!["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"]);
    }

    #[actix_rt::test]
    async fn test_identical_submissions_are_independent() {
        let api = Arc::new(ScriptedPredictions::new(vec![
            JobStatus::Starting,
            JobStatus::Processing,
            JobStatus::Succeeded,
        ]));
        let model = upscaler(api.clone());

        let (first, second) = futures::join!(
            model.upscale("https://example.com/cat.png", CancellationToken::new()),
            model.upscale("https://example.com/cat.png", CancellationToken::new()),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_ne!(first.prediction_id, second.prediction_id);
        assert_eq!(first.artifacts, vec![format!("https://cdn.example.com/{}.png", first.prediction_id)]);
        assert_eq!(second.artifacts, vec![format!("https://cdn.example.com/{}.png", second.prediction_id)]);
        assert_eq!(api.polls_for(&first.prediction_id), 3);
        assert_eq!(api.polls_for(&second.prediction_id), 3);
    }

    #[actix_rt::test]
    async fn test_failed_status_check_cancels_upstream() {
        let api = ScriptedPredictions::new(vec![JobStatus::Processing]).with_poll_failure(404);
        let created = submit(&api).await;

        let err = Poller::new(fast_policy())
            .wait_for_terminal(&api, created.clone(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            RelayError::Upstream { status, message, .. } => {
                assert_eq!(status, 404);
                assert!(message.contains("prediction not found"), "{}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(api.polls_for(&created.id), 1);
        assert_eq!(*api.cancelled.lock().unwrap(), vec![created.id]);
    }

    #[actix_rt::test]
    async fn test_dropped_request_cancels_running_job() {
        let api = Arc::new(ScriptedPredictions::new(vec![JobStatus::Processing]));
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(5),
            max_interval: Duration::from_millis(5),
            max_attempts: 1000,
            ..fast_policy()
        };
        let model = RealEsrgan::new(api.clone(), "v-test".to_string(), ModelInput::default(), Poller::new(policy));

        // The request future is dropped when the timeout fires, as on a client disconnect
        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            run_model(&model, "https://example.com/cat.png"),
        )
        .await;
        assert!(outcome.is_err());

        // The spawned poll notices the cancellation on its next await
        for _ in 0..100 {
            if !api.cancelled.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*api.cancelled.lock().unwrap(), vec!["job-1".to_string()]);
        assert!(api.polls_for("job-1") > 0);

        let polls = api.polls_for("job-1");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(api.polls_for("job-1"), polls);
    }
}
