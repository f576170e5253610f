//! Launch the platform browser at the upload page.

use std::io;
use std::process::Command;
use tracing::{debug, warn};

fn browser_command(url: &str) -> Command {
    #[cfg(target_os = "windows")]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/c", "start", url]);
        cmd
    }
    #[cfg(target_os = "macos")]
    {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

/// Start the browser and reap it on a background thread.
pub fn open_url(url: &str) -> io::Result<()> {
    let mut child = browser_command(url).spawn()?;
    debug!(%url, pid = child.id(), "launched browser");
    std::thread::spawn(move || {
        if let Err(e) = child.wait() {
            warn!(error = %e, "browser launcher did not exit cleanly");
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn uses_xdg_open_on_unix() {
        let cmd = browser_command("http://localhost:8080");
        assert_eq!(cmd.get_program(), "xdg-open");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["http://localhost:8080"]);
    }
}
