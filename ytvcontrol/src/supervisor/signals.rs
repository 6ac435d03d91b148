//! OS-level process control: terminate, suspend/continue and existence probe.

use std::io;
use std::process::{Command, Stdio};

use crate::backend::ControlTarget;

#[cfg(unix)]
mod imp {
    use super::*;

    fn send(pid: u32, signal: libc::c_int) -> io::Result<()> {
        let rc = unsafe { libc::kill(pid as libc::pid_t, signal) };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        Err(err)
    }

    fn killall(flag: &str, name: &str) -> io::Result<()> {
        let status = Command::new("killall")
            .arg(flag)
            .arg(name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("killall {} '{}' exited with {}", flag, name, status)))
        }
    }

    pub fn supports_suspend() -> bool {
        true
    }

    pub fn terminate(target: &ControlTarget, pid: u32) -> io::Result<()> {
        match target {
            ControlTarget::Pid => {
                send(pid, libc::SIGTERM)?;
                // A stopped process only acts on SIGTERM once continued.
                send(pid, libc::SIGCONT)
            }
            ControlTarget::ProcessName(name) => {
                killall("-TERM", name)?;
                let _ = killall("-CONT", name);
                Ok(())
            }
        }
    }

    pub fn suspend(target: &ControlTarget, pid: u32) -> io::Result<()> {
        match target {
            ControlTarget::Pid => send(pid, libc::SIGSTOP),
            ControlTarget::ProcessName(name) => killall("-STOP", name),
        }
    }

    pub fn resume(target: &ControlTarget, pid: u32) -> io::Result<()> {
        match target {
            ControlTarget::Pid => send(pid, libc::SIGCONT),
            ControlTarget::ProcessName(name) => killall("-CONT", name),
        }
    }

    /// Zero-signal probe.
    pub fn is_alive(pid: u32) -> bool {
        let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
        rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

#[cfg(windows)]
mod imp {
    use super::*;
    use std::os::windows::process::CommandExt;

    use winapi::shared::minwindef::{DWORD, FALSE};
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::minwinbase::STILL_ACTIVE;
    use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
    use winapi::um::winbase::CREATE_NO_WINDOW;
    use winapi::um::winnt::PROCESS_QUERY_LIMITED_INFORMATION;

    fn taskkill(args: &[&str]) -> io::Result<()> {
        let status = Command::new("taskkill")
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .creation_flags(CREATE_NO_WINDOW)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("taskkill {:?} exited with {}", args, status)))
        }
    }

    pub fn supports_suspend() -> bool {
        false
    }

    pub fn terminate(target: &ControlTarget, pid: u32) -> io::Result<()> {
        match target {
            ControlTarget::Pid => {
                if !is_alive(pid) {
                    return Ok(());
                }
                taskkill(&["/F", "/T", "/PID", &pid.to_string()])
            }
            ControlTarget::ProcessName(name) => taskkill(&["/F", "/IM", name]),
        }
    }

    pub fn suspend(_target: &ControlTarget, _pid: u32) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn resume(_target: &ControlTarget, _pid: u32) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    /// Handle query: open the process and check its exit code.
    pub fn is_alive(pid: u32) -> bool {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, FALSE, pid);
            if handle.is_null() {
                return false;
            }
            let mut code: DWORD = 0;
            let ok = GetExitCodeProcess(handle, &mut code);
            CloseHandle(handle);
            ok != 0 && code == STILL_ACTIVE
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod imp {
    use super::*;

    pub fn supports_suspend() -> bool {
        false
    }

    pub fn terminate(_target: &ControlTarget, _pid: u32) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn suspend(_target: &ControlTarget, _pid: u32) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn resume(_target: &ControlTarget, _pid: u32) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    pub fn is_alive(_pid: u32) -> bool {
        false
    }
}

pub use imp::{is_alive, resume, supports_suspend, suspend, terminate};

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        condition()
    }

    #[test]
    fn test_terminate_suspended_process() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        assert!(is_alive(pid));

        suspend(&ControlTarget::Pid, pid).unwrap();
        terminate(&ControlTarget::Pid, pid).unwrap();

        let status = child.wait().unwrap();
        assert!(!status.success());
        assert!(wait_until(Duration::from_secs(2), || !is_alive(pid)));
    }

    #[test]
    fn test_terminate_gone_process_is_ok() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        assert!(!is_alive(pid));
        assert!(terminate(&ControlTarget::Pid, pid).is_ok());
    }
}
