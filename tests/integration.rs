use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut c = cargo_bin_cmd!("posture-audit");
    // Keep a developer's RUST_LOG from leaking into assertions on stderr
    c.env_remove("RUST_LOG");
    c
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A small extracted filesystem with nginx, redis and a GitLab pipeline.
fn rootfs() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "etc/nginx/nginx.conf",
        "http {\n    include /etc/nginx/conf.d/*.conf;\n}\n",
    );
    write(dir.path(), "etc/nginx/conf.d/site.conf", "server { listen 443 ssl; }\n");
    write(dir.path(), "usr/sbin/nginx", "");
    write(dir.path(), "etc/redis/redis.conf", "bind 0.0.0.0\n");
    write(dir.path(), "app/.gitlab-ci.yml", "stages: [build]\n");
    dir
}

fn json_output(args: &[&str], root: &Path) -> serde_json::Value {
    let output = cmd()
        .args(args)
        .args(["--format", "json", "--cleanup"])
        .arg(root)
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

mod cli {
    use super::*;

    #[test]
    fn test_help() {
        cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--additional-scanner"))
            .stdout(predicate::str::contains("--cloud"));
    }

    #[test]
    fn test_missing_path_argument() {
        cmd().assert().failure().code(2);
    }

    #[test]
    fn test_nonexistent_root() {
        cmd()
            .arg("/definitely/not/a/rootfs")
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("image.tar");
        fs::write(&file, "").unwrap();

        cmd()
            .arg(&file)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("not a directory"));
    }

    #[test]
    fn test_bad_parameter_is_fatal() {
        let root = rootfs();
        cmd()
            .args(["-p", "no-equals-sign"])
            .arg(root.path())
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("no-equals-sign"));
    }

    #[test]
    fn test_missing_explicit_config_is_fatal() {
        let root = rootfs();
        cmd()
            .args(["--config", "/definitely/not/config.yaml"])
            .arg(root.path())
            .assert()
            .failure()
            .code(2);
    }
}

mod bundle {
    use super::*;

    #[test]
    fn test_json_bundle_lists_services_and_ci() {
        let root = rootfs();
        let bundle = json_output(&[], root.path());

        assert!(bundle["config_files"]["nginx"].is_string());
        assert!(bundle["config_files"]["redis"].is_string());
        assert!(bundle["config_files"].get("mysql").is_none());
        assert_eq!(bundle["ci_cd_tool"], "gitlab_ci");
        assert_eq!(bundle["failed_rules"], serde_json::json!([]));
        assert_eq!(bundle["cloud"], serde_json::json!({}));
        assert_eq!(bundle["additional_scans"], serde_json::json!({}));
    }

    #[test]
    fn test_no_ci_records_failure_signal() {
        let root = TempDir::new().unwrap();
        let bundle = json_output(&[], root.path());

        assert!(bundle["ci_cd_tool"].is_null());
        assert_eq!(
            bundle["failed_rules"],
            serde_json::json!(["cluster_no_ci_cd_tool_used"])
        );
    }

    #[test]
    fn test_service_filter() {
        let root = rootfs();
        let bundle = json_output(&["--service", "redis"], root.path());

        let services = bundle["config_files"].as_object().unwrap();
        assert_eq!(services.len(), 1);
        assert!(services.contains_key("redis"));
    }

    #[test]
    fn test_staging_kept_without_cleanup() {
        let root = rootfs();
        let output = cmd()
            .args(["--format", "json", "--service", "nginx"])
            .arg(root.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let bundle: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let staged = Path::new(bundle["config_files"]["nginx"].as_str().unwrap()).to_path_buf();
        assert!(staged.join("etc/nginx/nginx.conf").is_file());
        assert!(staged.join("etc/nginx/conf.d/site.conf").is_file());
        fs::remove_dir_all(staged).unwrap();
    }

    #[test]
    fn test_cleanup_removes_staging() {
        let root = rootfs();
        let bundle = json_output(&["--service", "nginx"], root.path());
        let staged = bundle["config_files"]["nginx"].as_str().unwrap();
        assert!(!Path::new(staged).exists());
    }

    #[test]
    fn test_output_file() {
        let root = rootfs();
        let out = TempDir::new().unwrap();
        let report = out.path().join("bundle.json");

        cmd()
            .args(["--format", "json", "--cleanup", "--output"])
            .arg(&report)
            .arg(root.path())
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        let bundle: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report).unwrap()).unwrap();
        assert_eq!(bundle["ci_cd_tool"], "gitlab_ci");
    }

    #[test]
    fn test_unknown_external_scanner_is_skipped() {
        let root = rootfs();
        let bundle = json_output(&["-a", "not-a-scanner"], root.path());
        assert_eq!(bundle["additional_scans"], serde_json::json!({}));
    }

    #[test]
    fn test_terminal_output() {
        let root = rootfs();
        cmd()
            .arg("--cleanup")
            .arg(root.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration files"))
            .stdout(predicate::str::contains("nginx"))
            .stdout(predicate::str::contains("gitlab_ci"));
    }
}

mod config_file {
    use super::*;

    #[test]
    fn test_explicit_config_selects_services() {
        let root = rootfs();
        let conf = TempDir::new().unwrap();
        let path = conf.path().join("posture.yaml");
        fs::write(&path, "discovery:\n  services: [nginx]\ncicd:\n  max_depth: 1\n").unwrap();

        let bundle = json_output(&["--config", path.to_str().unwrap()], root.path());
        let services = bundle["config_files"].as_object().unwrap();
        assert_eq!(services.len(), 1);
        assert!(services.contains_key("nginx"));
        // .gitlab-ci.yml sits at depth 2
        assert!(bundle["ci_cd_tool"].is_null());
    }
}
