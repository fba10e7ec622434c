//! Git preflight check.

use super::CheckResult;
use crate::services::git::GitCli;

/// Check that git is installed.
pub fn check() -> CheckResult {
    if GitCli::is_available() {
        match GitCli::version() {
            Ok(version) => CheckResult::ok("git", &format!("installed ({})", version)),
            Err(_) => CheckResult::ok("git", "installed"),
        }
    } else {
        CheckResult::fail("git", "not found", "Install git: sudo apt install git")
    }
}
