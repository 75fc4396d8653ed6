use std::{io, process::ExitStatus, time::Duration};

use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStdout},
    task::JoinHandle,
    time::timeout,
};

// Descendants of the archiver may keep its stderr open after it exited.
const DIAGNOSTICS_GRACE: Duration = Duration::from_secs(1);

/// A running archiver bound to a single request.
pub struct ArchiveProcess {
    child: Child,
    id: Option<u32>,
    output: Option<ChildStdout>,
    diagnostics: Option<JoinHandle<io::Result<Vec<u8>>>>,
}

impl ArchiveProcess {
    pub(super) fn new(mut child: Child) -> Self {
        let id = child.id();
        let output = child.stdout.take();
        // Drained concurrently so a chatty archiver never blocks on a full stderr pipe.
        let diagnostics = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).await?;
                Ok::<_, io::Error>(buf)
            })
        });
        Self {
            child,
            id,
            output,
            diagnostics,
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.id
    }

    pub fn take_output(&mut self) -> Option<ChildStdout> {
        self.output.take()
    }

    /// Send a kill signal. Terminating a process that already stopped is a no-op.
    pub fn terminate(&mut self) {
        match self.child.start_kill() {
            Ok(()) => log::debug!("Sent kill signal to archiver {}", self.label()),
            Err(err) => log::debug!("Archiver {} has already stopped: {}", self.label(), err),
        }
    }

    /// Terminate the archiver, wait for it and collect its diagnostics.
    pub async fn reap(mut self) -> io::Result<ExitStatus> {
        self.terminate();
        drop(self.output.take());
        let status = self.child.wait().await?;

        if let Some(mut diagnostics) = self.diagnostics.take() {
            match timeout(DIAGNOSTICS_GRACE, &mut diagnostics).await {
                Ok(Ok(Ok(stderr))) if !stderr.is_empty() => log::debug!(
                    "Archiver {} stderr: {}",
                    self.label(),
                    String::from_utf8_lossy(&stderr).trim_end()
                ),
                Ok(Ok(Ok(_))) => (),
                Ok(Ok(Err(err))) => {
                    log::debug!("Cannot read archiver {} stderr: {}", self.label(), err)
                }
                Ok(Err(err)) => log::debug!("Archiver {} stderr task failed: {}", self.label(), err),
                Err(_) => {
                    diagnostics.abort();
                    log::debug!("Archiver {} stderr still open, dropping it", self.label());
                }
            }
        }

        log::debug!("Archiver {} reaped ({})", self.label(), status);
        Ok(status)
    }

    fn label(&self) -> String {
        self.id
            .map_or_else(|| "<unknown pid>".to_owned(), |id| id.to_string())
    }
}
