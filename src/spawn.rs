//! Detached process launching.
//!
//! Children are started in their own session and forgotten: no waiting,
//! no exit status, no retry. The kernel reaps them once
//! `ignore_child_exits` has run.

use std::process::Command;

/// Let exited children be reaped without a wait.
///
/// Sets SIGCHLD to SIG_IGN for the whole process; call once at startup.
pub fn ignore_child_exits() {
    // SIG_IGN installs no handler code
    let previous = unsafe { libc::signal(libc::SIGCHLD, libc::SIG_IGN) };
    if previous == libc::SIG_ERR {
        log::warn!("Failed to ignore SIGCHLD; spawned programs will linger as zombies");
    }
}

/// Launch `command` detached from the window manager.
///
/// The command is split on whitespace; the first word is the program.
/// Returns whether the process was started.
pub fn spawn_detached(command: &str) -> bool {
    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some((program, args)) = parts.split_first() else {
        log::warn!("Refusing to spawn an empty command");
        return false;
    };

    let mut cmd = Command::new(program);
    cmd.args(args);

    // Detach from our session so the child survives us
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    match cmd.spawn() {
        Ok(child) => {
            log::info!("Spawned '{}' (pid {})", command, child.id());
            true
        }
        Err(e) => {
            log::error!("Failed to spawn '{}': {}", command, e);
            false
        }
    }
}
