mod cli {
    #![allow(non_snake_case)]

    use assert_cmd::prelude::*;
    use mockito::Server;
    use predicates::prelude::*;
    use predicates::str::contains;

    use std::fs;
    use std::path::Path;
    use std::process::Command;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    const NAME: &str = "linkrot";

    /// Command with config files, cache, progress bars and colors disabled.
    fn linkrot(root: &Path) -> Result<Command, Box<dyn std::error::Error>> {
        let mut cmd = Command::cargo_bin(NAME)?;
        cmd.env("NO_COLOR", "1")
            .arg(root)
            .args(["--no-config", "--no-progress", "--no-cache"]);
        Ok(cmd)
    }

    fn docs_with(contents: &str) -> Result<TempDir, Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("README.md"), contents)?;
        Ok(dir)
    }

    #[test]
    fn test_exit__when_no_root_provided() -> TestResult {
        let mut cmd = Command::cargo_bin(NAME)?;

        cmd.assert()
            .code(2)
            .stderr(contains("No root directory provided"));
        Ok(())
    }

    #[test]
    fn test_exit__when_root_unreadable() -> TestResult {
        let dir = TempDir::new()?;
        let mut cmd = linkrot(&dir.path().join("missing"))?;

        cmd.assert().code(2).stderr(contains("Error:"));
        Ok(())
    }

    #[test]
    fn test_exit__when_exclude_pattern_invalid() -> TestResult {
        let dir = docs_with("nothing to see\n")?;
        let mut cmd = linkrot(dir.path())?;
        cmd.args(["--exclude-pattern", "(unclosed"]);

        cmd.assert().code(2);
        Ok(())
    }

    #[tokio::test]
    async fn test_output__when_no_issues() -> TestResult {
        let mut server = Server::new_async().await;
        let _m200 = server.mock("HEAD", "/200").with_status(200).create_async().await;
        let dir = docs_with(&format!("Visit {}/200 today\n", server.url()))?;
        let mut cmd = linkrot(dir.path())?;

        cmd.assert()
            .success()
            .stdout(contains("No issues found"))
            .stdout(contains("1 ok, 0 broken, 0 excluded, 0 errors"));
        Ok(())
    }

    #[tokio::test]
    async fn test_output__when_remote_link_broken() -> TestResult {
        let mut server = Server::new_async().await;
        let _m404 = server.mock("HEAD", "/404").with_status(404).create_async().await;
        let endpoint = server.url() + "/404";
        let dir = docs_with(&format!("# Title\n\n[broken]({endpoint})\n"))?;
        let mut cmd = linkrot(dir.path())?;
        cmd.args(["--format", "minimal"]);

        cmd.assert()
            .code(1)
            .stdout(contains(format!("README.md:3: BROKEN {endpoint} (HTTP 404)")));
        Ok(())
    }

    #[test]
    fn test_output__when_local_file_missing() -> TestResult {
        let dir = docs_with("[guide](docs/guide.md)\n")?;
        let mut cmd = linkrot(dir.path())?;
        cmd.args(["--format", "minimal"]);

        cmd.assert()
            .code(1)
            .stdout(contains("README.md:1: BROKEN docs/guide.md (file not found)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_output__when_link_excluded() -> TestResult {
        let mut server = Server::new_async().await;
        let never = server
            .mock("HEAD", "/private")
            .with_status(500)
            .expect(0)
            .create_async()
            .await;
        let dir = docs_with(&format!("{}/private\n", server.url()))?;
        let mut cmd = linkrot(dir.path())?;
        cmd.args(["--exclude-pattern", "/private$"]);

        cmd.assert()
            .success()
            .stdout(contains("0 broken, 1 excluded"));
        never.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_output__json_format() -> TestResult {
        let mut server = Server::new_async().await;
        let _m200 = server.mock("HEAD", "/ok").with_status(200).create_async().await;
        let dir = docs_with(&format!("<a href=\"{}/ok\">ok</a>\n", server.url()))?;
        let mut cmd = linkrot(dir.path())?;
        cmd.args(["--format", "json"]);

        let output = cmd.output()?;
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
        assert_eq!(value["summary"]["ok"], 1);
        assert_eq!(value["outcomes"][0]["status"], "ok");
        Ok(())
    }

    #[test]
    fn test_output__quiet_prints_nothing() -> TestResult {
        let dir = docs_with("[gone](gone.md)\n")?;
        let mut cmd = linkrot(dir.path())?;
        cmd.arg("--quiet");

        cmd.assert().code(1).stdout(predicate::str::is_empty());
        Ok(())
    }

    #[test]
    fn test_report_file__lists_failures() -> TestResult {
        let dir = docs_with("[gone](gone.md)\n[here](README.md)\n")?;
        let report = dir.path().join("out").join("report.txt");
        let mut cmd = linkrot(dir.path())?;
        cmd.arg("--report").arg(&report).arg("--quiet");

        cmd.assert().code(1);
        let contents = fs::read_to_string(&report)?;
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.ends_with("README.md:1: BROKEN gone.md (file not found)\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_cache__second_run_makes_no_requests() -> TestResult {
        let mut server = Server::new_async().await;
        let once = server
            .mock("HEAD", "/cached")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;
        let dir = docs_with(&format!("{}/cached\n", server.url()))?;
        let cache = dir.path().join("cache.jsonl");

        for _ in 0..2 {
            Command::cargo_bin(NAME)?
                .env("NO_COLOR", "1")
                .arg(dir.path())
                .args(["--no-config", "--no-progress", "--quiet", "--cache"])
                .arg(&cache)
                .assert()
                .success();
        }

        once.assert_async().await;
        let cache_contents = fs::read_to_string(&cache)?;
        assert!(cache_contents.contains("\"status\":\"ok\""));
        Ok(())
    }

    #[test]
    fn test_completion_generate__bash() -> TestResult {
        let mut cmd = Command::cargo_bin(NAME)?;
        cmd.args(["completion-generate", "bash"]);

        cmd.assert().success().stdout(contains("linkrot"));
        Ok(())
    }

    #[test]
    fn test_help__lists_cache_options() -> TestResult {
        let mut cmd = Command::cargo_bin(NAME)?;
        cmd.arg("--help");

        cmd.assert()
            .success()
            .stdout(contains("--max-cache-age"))
            .stdout(contains("--exclude-pattern"))
            .stdout(contains("--run-timeout"));
        Ok(())
    }
}
