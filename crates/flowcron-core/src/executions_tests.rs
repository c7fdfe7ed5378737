//! Tests for the execution aggregator.

use super::*;
use crate::client::{RunObject, RunTask};
use crate::command::{render, RenderedCommand};
use crate::error::ClientError;
use crate::job::{ExecutionStatus, JobDefinition, TaskState};
use crate::memory_client::{MemoryObjectClient, Operation};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::mock;
use std::collections::HashMap;

mock! {
    Client {}

    #[async_trait]
    impl ObjectClient for Client {
        async fn create_run_object(&self, command: &RenderedCommand) -> std::result::Result<String, ClientError>;
        async fn list_objects(&self, filter: &LabelFilter) -> std::result::Result<Vec<RunObject>, ClientError>;
        async fn remove_objects(&self, filter: &LabelFilter) -> std::result::Result<(), ClientError>;
        async fn list_tasks(&self, object_id: &str) -> std::result::Result<Vec<RunTask>, ClientError>;
    }
}

fn run_object(id: &str, minute: u32) -> RunObject {
    RunObject {
        id: id.to_string(),
        name: id.to_string(),
        labels: HashMap::new(),
        image: "alpine".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, minute, 0).unwrap(),
    }
}

fn run_task(id: &str, object_id: &str, minute: u32, state: TaskState) -> RunTask {
    RunTask {
        id: id.to_string(),
        object_id: object_id.to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, minute, 30).unwrap(),
        status: ExecutionStatus::new(state),
    }
}

#[tokio::test]
async fn test_three_runs_give_three_records() {
    let client = Arc::new(MemoryObjectClient::new());
    let rendered = render(&JobDefinition::new("x", "alpine").with_schedule("@every 1s")).unwrap();
    for _ in 0..3 {
        client.create_run_object(&rendered).await.unwrap();
    }

    let aggregator = ExecutionAggregator::new(client.clone());
    let records = aggregator.list_executions("x").await.unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert!(record.created_at.timestamp() > 0);
        assert!(!record.run_identifier.is_empty());
        assert_eq!(record.status.state, TaskState::Complete);
    }
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let aggregator = ExecutionAggregator::new(Arc::new(MemoryObjectClient::new()));
    let err = aggregator.list_executions("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_listing_order_is_preserved() {
    let mut client = MockClient::new();
    client
        .expect_list_objects()
        .withf(|filter| filter == &LabelFilter::job("x"))
        .returning(|_| Ok(vec![run_object("late", 50), run_object("early", 10)]));
    client
        .expect_list_tasks()
        .withf(|id| id == "late")
        .returning(|_| Ok(vec![run_task("t1", "late", 50, TaskState::Failed)]));
    client.expect_list_tasks().withf(|id| id == "early").returning(|_| {
        Ok(vec![
            run_task("t2", "early", 10, TaskState::Shutdown),
            run_task("t3", "early", 11, TaskState::Complete),
        ])
    });

    let aggregator = ExecutionAggregator::new(Arc::new(client));
    let records = aggregator.list_executions("x").await.unwrap();
    let order: Vec<(&str, &str)> = records
        .iter()
        .map(|r| (r.run_identifier.as_str(), r.task_id.as_str()))
        .collect();
    assert_eq!(order, vec![("late", "t1"), ("early", "t2"), ("early", "t3")]);
    assert_eq!(records[0].status.state, TaskState::Failed);
}

#[tokio::test]
async fn test_task_listing_failure_discards_partial_result() {
    let mut client = MockClient::new();
    client
        .expect_list_objects()
        .returning(|_| Ok(vec![run_object("a", 1), run_object("b", 2)]));
    client
        .expect_list_tasks()
        .withf(|id| id == "a")
        .returning(|_| Ok(vec![run_task("t1", "a", 1, TaskState::Complete)]));
    client
        .expect_list_tasks()
        .withf(|id| id == "b")
        .returning(|_| Err(ClientError::Unavailable("This is an error".to_string())));

    let aggregator = ExecutionAggregator::new(Arc::new(client));
    let err = aggregator.list_executions("x").await.unwrap_err();
    assert!(matches!(err, CronError::Query(_)));
    assert!(err.to_string().contains("This is an error"));
}

#[tokio::test]
async fn test_object_listing_failure() {
    let client = Arc::new(MemoryObjectClient::new());
    client.fail(Operation::List, "This is an error");
    let aggregator = ExecutionAggregator::new(client.clone());

    assert!(matches!(
        aggregator.list_executions("x").await,
        Err(CronError::Query(_))
    ));
    assert_eq!(client.calls(Operation::ListTasks), 0);
}

#[tokio::test]
async fn test_job_with_no_tasks_yields_empty_history() {
    let mut client = MockClient::new();
    client
        .expect_list_objects()
        .returning(|_| Ok(vec![run_object("a", 1)]));
    client.expect_list_tasks().returning(|_| Ok(Vec::new()));

    let aggregator = ExecutionAggregator::new(Arc::new(client));
    assert!(aggregator.list_executions("x").await.unwrap().is_empty());
}
