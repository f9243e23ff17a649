//! Classic double-fork-less daemonisation for init scripts: fork once,
//! become session leader, detach from the terminal and point stdio at
//! /dev/null.

use std::io;

use anyhow::{bail, Result};

/// Must run before the async runtime starts any threads.
pub fn daemonize() -> Result<()> {
    // SAFETY: the process is still single-threaded here; every call below is
    // a plain syscall wrapper.
    unsafe {
        match libc::fork() {
            -1 => bail!("fork failed: {}", io::Error::last_os_error()),
            0 => {}
            _ => std::process::exit(0),
        }

        libc::umask(0);

        if libc::setsid() < 0 {
            bail!("setsid failed: {}", io::Error::last_os_error());
        }
        if libc::chdir(c"/tmp".as_ptr()) < 0 {
            bail!("chdir failed: {}", io::Error::last_os_error());
        }

        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_RDWR);
        if devnull < 0 {
            bail!("opening /dev/null failed: {}", io::Error::last_os_error());
        }
        libc::dup2(devnull, libc::STDIN_FILENO);
        libc::dup2(devnull, libc::STDOUT_FILENO);
        libc::dup2(devnull, libc::STDERR_FILENO);
        if devnull > libc::STDERR_FILENO {
            libc::close(devnull);
        }
    }

    Ok(())
}
