use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<Output> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to execute {program}"))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("failed to wait for {program}"))?
        {
            break status;
        }

        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            bail!("{program} timed out after {}s", timeout.as_secs());
        }

        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout, &program)?,
        stderr: collect(stderr, &program)?,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<io::Result<Vec<u8>>>, program: &str) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| anyhow!("output reader for {program} panicked"))?
        .with_context(|| format!("failed to read output of {program}"))
}

pub fn ensure_success(output: &Output, what: &str) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} returned non-zero exit status ({}): {}",
            what,
            output.status,
            stderr.trim()
        );
    }
    Ok(())
}

pub fn command_version_optional(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    first_output_line(&output)
}

pub fn command_version(program: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {} {}", program.display(), args.join(" ")))?;

    ensure_success(&output, &format!("{} {}", program.display(), args.join(" ")))?;
    Ok(first_output_line(&output).unwrap_or_else(|| "unknown".to_string()))
}

// poppler tools print their version banner on stderr.
fn first_output_line(output: &Output) -> Option<String> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
}
