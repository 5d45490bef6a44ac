//! Integration tests for the push-ingest HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use adc_scope_client::core::SampleBatch;
    use adc_scope_client::server::{run, ServerConfig};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (sender, _receiver) = crossbeam_channel::unbounded::<SampleBatch>();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), sender)
            .await
            .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_new_data_reaches_channel() {
        let (sender, receiver) = crossbeam_channel::unbounded::<SampleBatch>();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), sender)
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let payload = serde_json::json!({
            "raw": [512.0, 513.0, 511.0],
            "filtered": [510.2, 511.1, 510.8]
        });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/new_data", addr))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["queued"], 3);

        // The batch comes out of the channel unchanged.
        let batch = receiver
            .recv_timeout(Duration::from_secs(1))
            .expect("Batch never reached the channel");
        assert_eq!(batch.raw, vec![512.0, 513.0, 511.0]);
        assert_eq!(batch.filtered, vec![510.2, 511.1, 510.8]);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_new_data_rejects_wrong_shape() {
        let (sender, _receiver) = crossbeam_channel::unbounded::<SampleBatch>();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), sender)
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/new_data", addr))
            .header("Content-Type", "application/json")
            .body(r#"{"raw": "not a sequence"}"#)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_client_error());

        let _ = shutdown_tx.send(());
    }
}
