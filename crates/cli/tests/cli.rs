use assert_cmd::Command;

fn bookshelf() -> Command {
    let mut cmd = Command::cargo_bin("bookshelf").unwrap();
    cmd.env("BOOKSHELF_ENV", "local")
        .env("BOOKSHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"));
    cmd
}

#[test]
fn migrations_print_books_table() {
    let output = bookshelf().arg("migrations").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("-- book/001_init"));
    assert!(stdout.contains("CREATE TABLE IF NOT EXISTS books"));
}

#[test]
fn config_masks_api_key() {
    let output = bookshelf()
        .arg("config")
        .env("BOOKSHELF_STORE__API_KEY", "super-secret")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"api_key\": \"***\""));
    assert!(!stdout.contains("super-secret"));
}

#[test]
fn unknown_environment_fails() {
    bookshelf()
        .arg("config")
        .env("BOOKSHELF_ENV", "qa")
        .assert()
        .failure();
}
