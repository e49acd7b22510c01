use std::fs;

use tempfile::TempDir;

use crate::AppState;

/// Create an [AppState] backed by files in a fresh temporary directory.
///
/// The directory is deleted when the returned [TempDir] is dropped, so keep it
/// alive for the duration of the test.
pub(crate) fn get_test_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("Could not create temporary directory");
    let db_path = dir.path().join("expense.db");
    let categories_path = dir.path().join("categories.json");
    fs::write(&categories_path, "{\"categories\": [\"Food\", \"Travel\"]}")
        .expect("Could not write test category catalog");

    let state = AppState::new(&db_path, &categories_path).expect("Could not create test state");

    (dir, state)
}
