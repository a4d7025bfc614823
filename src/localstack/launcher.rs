use crate::localstack::{Error, service};
use crate::session;

use std::{net, process, sync, time};
use tokio::{io::AsyncReadExt, net::TcpStream, process::Command, task};

/// Bytes of process stderr kept for error reports.
const STDERR_TAIL: usize = 4096;

/// How long a failed start waits for the remaining stderr output.
const STDERR_GRACE: time::Duration = time::Duration::from_secs(1);

/// How LocalStack is launched and awaited.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalstackConfig {
    /// Program to run.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
    /// Host whose service ports are polled.
    pub host: net::IpAddr,
    /// Delay between two readiness checks.
    pub poll_interval: time::Duration,
    /// How long to wait for every service port to accept connections.
    pub startup_timeout: time::Duration,
    /// How long to wait for the process to exit after SIGINT before killing it.
    pub stop_timeout: time::Duration,
}

impl Default for LocalstackConfig {
    fn default() -> Self {
        Self {
            program: "localstack".to_string(),
            args: vec!["start".to_string()],
            host: net::IpAddr::V4(net::Ipv4Addr::LOCALHOST),
            poll_interval: time::Duration::from_millis(500),
            startup_timeout: time::Duration::from_secs(120),
            stop_timeout: time::Duration::from_secs(30),
        }
    }
}

/// Run `{program} --version` and return what it printed.
pub async fn check_installed(config: &LocalstackConfig) -> Result<String, Error> {
    let output = Command::new(&config.program)
        .arg("--version")
        .stdin(process::Stdio::null())
        .output()
        .await
        .map_err(|error| Error::NotInstalled {
            program: config.program.clone(),
            reason: error.to_string(),
        })?;
    if !output.status.success() {
        return Err(Error::NotInstalled {
            program: config.program.clone(),
            reason: format!("`--version` exited with {}", output.status),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// A running LocalStack process.
///
/// Dropping the handle sends SIGINT to a process still running, so the CLI gets to stop
/// its container. [`Localstack::stop`] does the same and also waits for the exit.
///
/// ```rust,no_run
/// use aws_utils::localstack::{Localstack, LocalstackConfig, Service};
/// use aws_utils::session;
///
/// # async fn example() -> Result<(), aws_utils::localstack::Error> {
/// let localstack = Localstack::start(LocalstackConfig::default(), &[Service::DYNAMODB]).await?;
/// session::init(localstack.session_config(Service::DYNAMODB)).await;
/// // ...
/// localstack.stop().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Localstack {
    child: tokio::process::Child,
    config: LocalstackConfig,
    services: Vec<service::Service>,
}

impl Localstack {
    /// Launch LocalStack with `services` enabled and wait until each of their ports
    /// accepts connections.
    #[tracing::instrument(
        name = "aws_utils.localstack.start",
        skip_all,
        fields(program = %config.program, services = %join_names(services)),
        err
    )]
    pub async fn start(config: LocalstackConfig, services: &[service::Service]) -> Result<Self, Error> {
        for service in services {
            if listening(config.host, *service, config.poll_interval).await {
                return Err(Error::PortInUse {
                    service: service.name.to_string(),
                    port: service.port,
                });
            }
        }
        let names = join_names(services);
        let mut child = Command::new(&config.program)
            .args(&config.args)
            .env("SERVICES", &names)
            .stdin(process::Stdio::null())
            .stdout(process::Stdio::null())
            .stderr(process::Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: config.program.clone(),
                source,
            })?;
        tracing::info!(pid = child.id(), "localstack spawned");
        let mut stderr = StderrTail::capture(child.stderr.take());
        let mut localstack = Self {
            child,
            config,
            services: services.to_vec(),
        };
        let deadline = tokio::time::Instant::now() + localstack.config.startup_timeout;
        loop {
            if let Some(status) = localstack.child.try_wait().map_err(Error::Process)? {
                let stderr = stderr.finish().await;
                return Err(Error::ExitedEarly { status, stderr });
            }
            if all_listening(localstack.config.host, services, localstack.config.poll_interval).await {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                if let Err(error) = localstack.child.kill().await {
                    tracing::warn!(%error, "failed to kill localstack");
                }
                let stderr = stderr.finish().await;
                return Err(Error::StartupTimeout {
                    services: names,
                    timeout: localstack.config.startup_timeout,
                    stderr,
                });
            }
            tokio::time::sleep(localstack.config.poll_interval).await;
        }
        // the ports may belong to a process that raced us
        if let Some(status) = localstack.child.try_wait().map_err(Error::Process)? {
            let stderr = stderr.finish().await;
            return Err(Error::ExitedEarly { status, stderr });
        }
        tracing::info!("localstack ready");
        Ok(localstack)
    }

    /// Process id, unless the process has already been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Services LocalStack was started with.
    pub fn services(&self) -> &[service::Service] {
        &self.services
    }

    /// Session configuration pointed at `service`.
    pub fn session_config(&self, service: service::Service) -> session::SessionConfig {
        session::SessionConfig::localstack(service.endpoint_url())
    }

    /// Send SIGINT and wait for the process to exit, killing it after the stop timeout.
    #[tracing::instrument(name = "aws_utils.localstack.stop", skip_all, err)]
    pub async fn stop(mut self) -> Result<(), Error> {
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let status = Command::new("kill")
            .args(["-INT", &pid.to_string()])
            .status()
            .await
            .map_err(Error::Stop)?;
        if !status.success() {
            tracing::warn!(pid, %status, "kill -INT failed");
        }
        match tokio::time::timeout(self.config.stop_timeout, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(Error::Stop)?;
                tracing::info!(%status, "localstack stopped");
            }
            Err(_) => {
                tracing::warn!(pid, "localstack ignored SIGINT, killing it");
                self.child.kill().await.map_err(Error::Stop)?;
            }
        }
        Ok(())
    }
}

impl Drop for Localstack {
    fn drop(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        tracing::warn!(pid, "localstack dropped while running, sending SIGINT");
        let status = process::Command::new("kill")
            .args(["-INT", &pid.to_string()])
            .stdin(process::Stdio::null())
            .stdout(process::Stdio::null())
            .stderr(process::Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::warn!(pid, %status, "kill -INT failed"),
            Err(error) => tracing::warn!(pid, %error, "kill -INT failed"),
        }
    }
}

/// Last [`STDERR_TAIL`] bytes written by the process on stderr.
///
/// The pipe is drained in the background for the life of the process, so a chatty
/// child never blocks on a full pipe.
struct StderrTail {
    buffer: sync::Arc<sync::Mutex<Vec<u8>>>,
    reader: Option<task::JoinHandle<()>>,
}

impl StderrTail {
    fn capture(stderr: Option<tokio::process::ChildStderr>) -> Self {
        let buffer = sync::Arc::new(sync::Mutex::new(Vec::new()));
        let reader = stderr.map(|mut stderr| {
            let buffer = sync::Arc::clone(&buffer);
            tokio::spawn(async move {
                let mut chunk = [0; 1024];
                while let Ok(read @ 1..) = stderr.read(&mut chunk).await {
                    let mut buffer = buffer.lock().unwrap_or_else(sync::PoisonError::into_inner);
                    buffer.extend_from_slice(&chunk[..read]);
                    let excess = buffer.len().saturating_sub(STDERR_TAIL);
                    buffer.drain(..excess);
                }
            })
        });
        Self { buffer, reader }
    }

    /// Wait up to [`STDERR_GRACE`] for end of file and return the captured text.
    async fn finish(&mut self) -> String {
        if let Some(reader) = self.reader.as_mut() {
            if tokio::time::timeout(STDERR_GRACE, reader).await.is_err() {
                tracing::debug!("stderr still open, reporting what was read");
            }
        }
        let buffer = self.buffer.lock().unwrap_or_else(sync::PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).trim().to_string()
    }
}

fn join_names(services: &[service::Service]) -> String {
    services
        .iter()
        .map(|service| service.name)
        .collect::<Vec<_>>()
        .join(",")
}

async fn all_listening(
    host: net::IpAddr,
    services: &[service::Service],
    connect_timeout: time::Duration,
) -> bool {
    for service in services {
        if !listening(host, *service, connect_timeout).await {
            tracing::debug!(service = service.name, port = service.port, "not ready");
            return false;
        }
    }
    true
}

async fn listening(host: net::IpAddr, service: service::Service, connect_timeout: time::Duration) -> bool {
    let connect = TcpStream::connect((host, service.port));
    matches!(tokio::time::timeout(connect_timeout, connect).await, Ok(Ok(_)))
}
