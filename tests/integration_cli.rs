// Drives the compiled binary through its non-interactive paths.
// HOME and XDG dirs point at a temp dir so no real progress or config is touched.

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

fn spotter(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("spotter").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env("XDG_DATA_HOME", home.path().join(".local").join("share"))
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn achievements_start_locked() {
    let home = tempdir().unwrap();
    let output = spotter(&home).arg("--achievements").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ ] firstCorrect"));
    assert!(stdout.contains("[ ] allCorrectCompetitive"));
    assert!(!stdout.contains("[x]"));
    assert!(home
        .path()
        .join(".local/state/spotter/progress.db")
        .exists());
}

#[test]
fn stars_are_empty_on_first_run() {
    let home = tempdir().unwrap();
    let output = spotter(&home).arg("--stars").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no adventure levels played yet"));
}

#[test]
fn quitting_ends_the_game() {
    let home = tempdir().unwrap();
    let output = spotter(&home)
        .args(["--no-persist", "--seed", "5", "--mode", "competitive"])
        .write_stdin("q\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("competitive game"));
    assert!(stdout.contains("final score: you 0 / predictor 0 over 0 round(s)"));
}

#[test]
fn quitting_a_level_ranks_nothing() {
    let home = tempdir().unwrap();
    let output = spotter(&home)
        .args(["--seed", "5", "--mode", "adventure", "--level", "0"])
        .write_stdin("q\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("unlocked"));
    assert!(!stdout.contains("lesion0:"));

    let output = spotter(&home).arg("--stars").output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("no adventure levels played yet"));
}

#[test]
fn locked_level_is_refused() {
    let home = tempdir().unwrap();
    spotter(&home)
        .args(["--no-persist", "--mode", "adventure", "--level", "2"])
        .write_stdin("q\n")
        .assert()
        .failure();
}

#[test]
fn saved_config_is_reused() {
    let home = tempdir().unwrap();
    spotter(&home)
        .args(["--mode", "competitive", "--save-config", "--stars"])
        .assert()
        .success();

    let output = spotter(&home)
        .args(["--no-persist", "--seed", "1"])
        .write_stdin("q\n")
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("competitive game"));
}
