// ABOUTME: Integration tests for the one-image binary.
// ABOUTME: Validates argument handling, failure output, and end-to-end runs.

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::fake_one::{FakeOne, Reply, image_xml, ok_int, ok_string, pool_xml};

fn one_image_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("one-image"));
    cmd.env_remove("ONE_URL")
        .env_remove("ONE_USERNAME")
        .env_remove("ONE_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_options() {
    one_image_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--api-url"))
        .stdout(predicate::str::contains("--new-name"))
        .stdout(predicate::str::contains("--check"));
}

#[test]
fn missing_connection_parameters_fail_before_network() {
    one_image_cmd()
        .args(["--id", "1"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"failed\":true"))
        .stderr(predicate::str::contains("connection parameters"));
}

#[test]
fn environment_supplies_connection_parameters() {
    // Nothing listens on the discard port, so getting past resolution means
    // the failure is a transport error, not a missing parameter.
    one_image_cmd()
        .env("ONE_URL", "http://127.0.0.1:9/RPC2")
        .env("ONE_USERNAME", "oneadmin")
        .env("ONE_PASSWORD", "secret")
        .args(["--id", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("connection parameters").not());
}

#[test]
fn id_and_name_conflict() {
    one_image_cmd()
        .args(["--id", "1", "--name", "debian"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_target_is_reported() {
    one_image_cmd()
        .args([
            "--api-url",
            "http://127.0.0.1:9/RPC2",
            "--api-username",
            "oneadmin",
            "--api-password",
            "secret",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "one of 'id' or 'name' must be specified",
        ));
}

#[test]
fn invalid_enabled_value_is_rejected() {
    one_image_cmd()
        .args(["--id", "1", "--enabled", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--enabled"));
}

#[test]
fn text_format_errors() {
    one_image_cmd()
        .args(["--id", "1", "--format", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: "));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yml");

    one_image_cmd()
        .args(["--id", "1", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

mod end_to_end {
    use super::*;

    fn pool() -> Reply {
        Reply::Xml(ok_string(&pool_xml(&[
            image_xml(3, "debian", 1, 0),
            image_xml(4, "alpine", 3, 0),
        ])))
    }

    async fn run(args: Vec<String>) -> assert_cmd::assert::Assert {
        tokio::task::spawn_blocking(move || one_image_cmd().args(args).assert())
            .await
            .unwrap()
    }

    fn args(server: &FakeOne, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            "--api-url".to_string(),
            server.url().to_string(),
            "--api-username".to_string(),
            "oneadmin".to_string(),
            "--api-password".to_string(),
            "secret".to_string(),
        ];
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn present_image_is_reported() {
        let server = FakeOne::start().await;
        server.on("one.imagepool.info", vec![pool()]);

        let assert = run(args(&server, &["--name", "debian"])).await.success();

        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
        assert_eq!(report["id"], 3);
        assert_eq!(report["name"], "debian");
        assert_eq!(report["state"], "READY");
        assert_eq!(report["used"], false);
        assert_eq!(report["changed"], false);
        assert_eq!(server.methods(), ["one.imagepool.info"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn enable_disabled_image() {
        let server = FakeOne::start().await;
        server
            .on("one.imagepool.info", vec![pool()])
            .on(
                "one.image.info",
                vec![
                    Reply::Xml(ok_string(&image_xml(4, "alpine", 3, 0))),
                    Reply::Xml(ok_string(&image_xml(4, "alpine", 1, 0))),
                ],
            )
            .on("one.image.enable", vec![Reply::Xml(ok_int(4))]);

        let assert = run(args(&server, &["--id", "4", "--enabled", "true"]))
            .await
            .success();

        let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
        let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
        assert_eq!(report["state"], "READY");
        assert_eq!(report["changed"], true);
        assert!(server.methods().contains(&"one.image.enable".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn check_mode_skips_mutation() {
        let server = FakeOne::start().await;
        server
            .on("one.imagepool.info", vec![pool()])
            .on(
                "one.image.info",
                vec![Reply::Xml(ok_string(&image_xml(3, "debian", 1, 0)))],
            );

        run(args(&server, &["--id", "3", "--enabled", "false", "--check"]))
            .await
            .success()
            .stdout(predicate::str::contains("\"state\":\"DISABLED\""))
            .stdout(predicate::str::contains("\"changed\":true"));

        assert!(!server.methods().contains(&"one.image.enable".to_string()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn delete_of_missing_image_reports_only_changed() {
        let server = FakeOne::start().await;
        server.on("one.imagepool.info", vec![pool()]);

        run(args(&server, &["--id", "99", "--state", "absent"]))
            .await
            .success()
            .stdout(predicate::str::diff("{\"changed\":false}\n"));
    }
}
