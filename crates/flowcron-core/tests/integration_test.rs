//! Integration tests for the scheduler against the in-memory object client.

use std::collections::HashMap;
use std::sync::Arc;

use flowcron_core::labels::{COMMAND, MARKER, NAME, SCHEDULE};
use flowcron_core::{
    CronScheduler, ExecutionAggregator, JobDefinition, JobScheduler, MemoryObjectClient,
    Operation,
};
use rand::Rng;
use rand::seq::SliceRandom;

fn seeded_labels(name: &str, schedule: &str, command: &str) -> HashMap<String, String> {
    [
        (MARKER, "true"),
        (NAME, name),
        (SCHEDULE, schedule),
        (COMMAND, command),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[tokio::test]
async fn test_restart_recovers_every_seeded_job() {
    let client = Arc::new(MemoryObjectClient::new());
    let n = 12;
    for i in 0..n {
        client
            .seed(
                seeded_labels(
                    &format!("job-{:02}", i),
                    &format!("{} * * * *", i),
                    &format!("docker service create --restart-condition none alpine echo {}", i),
                ),
                &format!("alpine:3.{}", i),
            )
            .await;
    }
    // Older runs of an existing job must not produce extra triggers.
    client
        .seed(
            seeded_labels("job-00", "0 * * * *", "docker service create --restart-condition none alpine echo 0"),
            "alpine:3.0",
        )
        .await;

    let scheduler = CronScheduler::new(client.clone());
    assert_eq!(scheduler.reschedule_jobs().await.unwrap(), n);
    assert_eq!(scheduler.active_triggers().len(), n);

    let jobs = scheduler.get_jobs().await.unwrap();
    assert_eq!(jobs.len(), n);
    for i in 0..n {
        let job = &jobs[&format!("job-{:02}", i)];
        assert_eq!(job.schedule, format!("{} * * * *", i));
        assert_eq!(job.image, format!("alpine:3.{}", i));
        assert_eq!(
            job.command,
            format!("docker service create --restart-condition none alpine echo {}", i)
        );
    }

    scheduler.stop().await;
}

#[tokio::test]
async fn test_full_lifecycle_with_history() {
    let client = Arc::new(MemoryObjectClient::new());
    let scheduler = CronScheduler::new(client.clone());
    let aggregator = ExecutionAggregator::new(client.clone());

    let job = JobDefinition::new("report", "alpine")
        .with_command("echo report")
        .with_schedule("@every 100ms");
    scheduler.add_job(job).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    scheduler.stop().await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let history = aggregator.list_executions("report").await.unwrap();
    assert!(history.len() >= 2);
    assert!(history.iter().all(|r| !r.run_identifier.is_empty()));

    scheduler.remove_job("report").await.unwrap();
    assert!(aggregator.list_executions("report").await.unwrap_err().is_not_found());
    assert_eq!(client.object_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_remove_keeps_mapping_consistent() {
    for _round in 0..5 {
        let client = Arc::new(MemoryObjectClient::new());
        let scheduler = Arc::new(CronScheduler::new(client.clone()));

        let names: Vec<String> = (0..32).map(|i| format!("job-{}", i)).collect();
        let mut rng = rand::rng();
        let removed: Vec<bool> = names.iter().map(|_| rng.random_range(0..3) == 0).collect();

        // Each job gets its own add and, for some, a trailing remove.
        let mut order: Vec<usize> = (0..names.len()).collect();
        order.shuffle(&mut rng);

        let mut tasks = Vec::new();
        for idx in order {
            let scheduler = scheduler.clone();
            let name = names[idx].clone();
            let remove = removed[idx];
            let delay = rng.random_range(0..5u64);
            tasks.push(tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                let job = JobDefinition::new(name.clone(), "alpine").with_schedule("@yearly");
                scheduler.add_job(job).await.unwrap();
                if remove {
                    tokio::task::yield_now().await;
                    scheduler.remove_job(&name).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut expected: Vec<String> = names
            .iter()
            .zip(&removed)
            .filter(|(_, removed)| !**removed)
            .map(|(name, _)| name.clone())
            .collect();
        expected.sort();

        assert_eq!(scheduler.active_triggers(), expected);

        let mut listed: Vec<String> = scheduler.get_jobs().await.unwrap().into_keys().collect();
        listed.sort();
        assert_eq!(listed, expected);
        assert_eq!(client.calls(Operation::Create), names.len());

        scheduler.stop().await;
    }
}
