//! Tests for the command builder.

use super::*;
use crate::labels::{decode, ARGS, COMMAND, MARKER, NAME, RUN_COMMAND, SCHEDULE};

fn hello_job() -> JobDefinition {
    JobDefinition::new("my-job", "alpine").with_command(r#"echo "Hello Cron!""#)
}

#[test]
fn test_render_adds_restart_condition_none() {
    let rendered = render(&hello_job()).unwrap();
    assert_eq!(
        rendered.body,
        vec!["--restart-condition none", "alpine", r#"echo "Hello Cron!""#]
    );
    assert_eq!(
        rendered.command_line(),
        r#"docker service create --restart-condition none alpine echo "Hello Cron!""#
    );
}

#[test]
fn test_render_writes_labels() {
    let rendered = render(&hello_job()).unwrap();
    assert_eq!(
        rendered.label(COMMAND),
        Some(r#"docker service create --restart-condition none alpine echo "Hello Cron!""#)
    );
    assert_eq!(rendered.label(MARKER), Some("true"));
    assert_eq!(rendered.label(NAME), Some("my-job"));
    assert_eq!(rendered.label(SCHEDULE), Some(""));
    assert_eq!(rendered.label(ARGS), Some("[]"));
    assert_eq!(rendered.label(RUN_COMMAND), Some(r#"echo "Hello Cron!""#));
}

#[test]
fn test_render_keeps_explicit_restart_condition_none() {
    let job = hello_job().with_arg("--restart-condition=none");
    let rendered = render(&job).unwrap();
    assert_eq!(rendered.body[0], "--restart-condition=none");
    assert_eq!(rendered.body.len(), 3);
}

#[test]
fn test_render_passes_user_flags_before_image() {
    let job = hello_job()
        .with_schedule("@every 1s")
        .with_arg("--constraint 'node.role==worker'")
        .with_arg("  ");
    let rendered = render(&job).unwrap();
    assert_eq!(
        rendered.command_line(),
        r#"docker service create --constraint 'node.role==worker' --restart-condition none alpine echo "Hello Cron!""#
    );
    assert_eq!(
        rendered.label(ARGS),
        Some(r#"["--constraint 'node.role==worker'"]"#)
    );
}

#[test]
fn test_render_shell_line() {
    let job = JobDefinition::new("my-job", "alpine")
        .with_schedule("@yearly")
        .with_command("echo it's");
    let rendered = render(&job).unwrap();
    let shell = rendered.to_shell();

    assert!(shell.starts_with(
        "docker service create -l 'com.df.cron=true' -l 'com.df.cron.name=my-job' -l 'com.df.cron.schedule=@yearly'"
    ));
    assert!(shell.contains(
        r#"-l 'com.df.cron.command=docker service create --restart-condition none alpine echo it'\''s'"#
    ));
    assert!(shell.ends_with("--restart-condition none alpine echo it's"));
}

#[test]
fn test_render_without_command_ends_with_image() {
    let rendered = render(&JobDefinition::new("j", "alpine")).unwrap();
    assert_eq!(rendered.tokens().last().map(String::as_str), Some("alpine"));
    assert_eq!(
        rendered.command_line(),
        "docker service create --restart-condition none alpine"
    );
}

#[test]
fn test_rejects_empty_name() {
    let job = JobDefinition::new("", "my-image").with_schedule("@yearly");
    assert!(matches!(render(&job), Err(CronError::Validation(_))));
}

#[test]
fn test_rejects_empty_image() {
    let job = JobDefinition::new("my-job", " ").with_schedule("@yearly");
    assert!(matches!(render(&job), Err(CronError::Validation(_))));
}

#[test]
fn test_rejects_restart_condition_other_than_none() {
    for arg in [
        "--restart-condition any",
        "--restart-condition on-failure",
        "--restart-condition=any",
        "--restart-condition",
    ] {
        let job = hello_job().with_arg(arg);
        let err = render(&job).unwrap_err();
        assert!(
            matches!(err, CronError::Validation(ref msg) if msg.contains("--restart-condition")),
            "{} should be rejected, got {:?}",
            arg,
            err
        );
    }
}

#[test]
fn test_accepts_quoted_none() {
    let job = hello_job().with_arg("--restart-condition 'none'");
    assert!(render(&job).is_ok());
}

#[test]
fn test_rejects_name_override() {
    for arg in ["--name some-name", "--name=some-name", "--name"] {
        let job = hello_job().with_arg(arg);
        assert!(
            matches!(render(&job), Err(CronError::Validation(ref msg)) if msg.contains("--name")),
            "{} should be rejected",
            arg
        );
    }
}

#[test]
fn test_flag_value_requires_separator() {
    assert_eq!(flag_value("--name x", "--name"), Some("x"));
    assert_eq!(flag_value("--name=x", "--name"), Some("x"));
    assert_eq!(flag_value("--names x", "--name"), None);
    assert_eq!(flag_value("--label x", "--name"), None);
}

#[test]
fn test_render_then_decode_round_trip() {
    let jobs = [
        hello_job().with_schedule("@every 1s"),
        JobDefinition::new("nightly", "busybox:1.36")
            .with_schedule("0 0 * * *")
            .with_command("sh -c 'date; echo done'")
            .with_arg("--env FOO=bar")
            .with_arg("--restart-condition none"),
        JobDefinition::new("once", "alpine"),
    ];

    for job in jobs {
        let rendered = render(&job).unwrap();
        let decoded = decode(&rendered.label_map()).unwrap();
        assert_eq!(decoded.name, job.name);
        assert_eq!(decoded.schedule, job.schedule);
        assert_eq!(decoded.command, job.command);
        assert_eq!(decoded.args, job.args);
        assert_eq!(decoded.invocation, rendered.command_line());
    }
}

#[test]
fn test_flags_later_in_a_fragment_are_checked() {
    for arg in [
        "--env A=1 --restart-condition any",
        "--env A=1 --restart-condition=on-failure",
        "--env A=1 --name evil",
        "--env A=1 --name=evil",
    ] {
        let job = hello_job().with_arg(arg);
        assert!(
            matches!(render(&job), Err(CronError::Validation(_))),
            "{} should be rejected",
            arg
        );
    }
}

#[test]
fn test_restart_none_later_in_a_fragment_is_not_repeated() {
    let job = hello_job().with_arg("--env A=1 --restart-condition none");
    let rendered = render(&job).unwrap();
    assert_eq!(
        rendered.command_line(),
        r#"docker service create --env A=1 --restart-condition none alpine echo "Hello Cron!""#
    );
}

#[test]
fn test_run_command_label_keeps_surrounding_whitespace() {
    let job = JobDefinition::new("padded", "alpine").with_command("  echo hi ");
    let rendered = render(&job).unwrap();
    assert_eq!(rendered.label(RUN_COMMAND), Some("  echo hi "));
    assert!(rendered.command_line().ends_with("alpine echo hi"));

    let decoded = decode(&rendered.label_map()).unwrap();
    assert_eq!(decoded.command, "  echo hi ");
}

#[test]
fn test_command_shaped_like_an_invocation_keeps_the_image() {
    let job = JobDefinition::new("nested", "docker:cli")
        .with_schedule("@daily")
        .with_command("docker service create --restart-condition none busybox true");
    let rendered = render(&job).unwrap();
    assert_eq!(
        rendered.command_line(),
        "docker service create --restart-condition none docker:cli \
         docker service create --restart-condition none busybox true"
    );
    assert_eq!(
        rendered.label(RUN_COMMAND),
        Some("docker service create --restart-condition none busybox true")
    );
}

#[test]
fn test_legacy_invocation_is_replayed_not_nested() {
    let legacy = r#"docker service create --restart-condition none alpine echo "Hello World!""#;
    let job = JobDefinition::new("my-job-1", "alpine:3.5")
        .with_schedule("@every 1s")
        .with_command(legacy);

    let rendered = render_recovered(&job, Some(legacy)).unwrap();
    assert_eq!(rendered.command_line(), legacy);
    assert!(rendered.to_shell().ends_with(r#"--restart-condition none alpine echo "Hello World!""#));
    assert_eq!(rendered.image, "alpine:3.5");
    assert_eq!(rendered.label(ARGS), None);
    assert_eq!(rendered.label(RUN_COMMAND), None);

    // The replayed object decodes as legacy again.
    let decoded = decode(&rendered.label_map()).unwrap();
    assert_eq!(decoded.legacy_invocation.as_deref(), Some(legacy));
    let again = render_recovered(&job, decoded.legacy_invocation.as_deref()).unwrap();
    assert_eq!(again, rendered);
}

#[test]
fn test_legacy_invocation_is_still_validated() {
    for legacy in [
        "docker service create --name sneaky --restart-condition none alpine",
        "docker service create --restart-condition any alpine",
    ] {
        let job = JobDefinition::new("x", "alpine").with_command(legacy);
        assert!(matches!(
            render_recovered(&job, Some(legacy)),
            Err(CronError::Validation(_))
        ));
    }
}

#[test]
fn test_recovered_without_invocation_renders_normally() {
    let job = JobDefinition::new("x", "alpine").with_command("echo");
    assert_eq!(render_recovered(&job, None).unwrap(), render(&job).unwrap());

    // Legacy text that is not an invocation renders like a new job.
    let rendered = render_recovered(&job, Some("echo")).unwrap();
    assert_eq!(rendered.command_line(), "docker service create --restart-condition none alpine echo");
}

#[test]
fn test_user_command_mentioning_docker_is_not_replayed_with_args() {
    let job = JobDefinition::new("x", "docker:cli")
        .with_command("docker service create --detach alpine")
        .with_arg("--mount type=bind,src=/var/run/docker.sock,dst=/var/run/docker.sock");
    let rendered = render(&job).unwrap();
    assert!(rendered.command_line().ends_with("docker:cli docker service create --detach alpine"));
}

#[test]
fn test_shell_quote() {
    assert_eq!(shell_quote("a b"), "'a b'");
    assert_eq!(shell_quote("it's"), r"'it'\''s'");
}
