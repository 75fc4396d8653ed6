use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Stdio,
};

use tokio::process::Command;

use crate::{
    archive::ArchiveProcess,
    error::{archive as ArchiveError, Error},
};

/// External program writing a zip archive of its working directory to stdout.
#[derive(Clone, Debug)]
pub struct Archiver {
    program: OsString,
    args: Vec<OsString>,
}

impl Archiver {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: AsRef<OsStr>,
        I: IntoIterator<Item = A>,
        A: AsRef<OsStr>,
    {
        Self {
            program: program.as_ref().to_owned(),
            args: args.into_iter().map(|a| a.as_ref().to_owned()).collect(),
        }
    }

    /// Info-ZIP invocation: quiet, recursive, archive written to stdout.
    pub fn zip<P: AsRef<OsStr>>(program: P) -> Self {
        Self::new(program, ["-q", "-r", "-", "."])
    }

    pub fn spawn(&self, dir: &Path) -> Result<ArchiveProcess, Error> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                log::error!("Cannot spawn archiver {:?}: {}", self.program, err);
                ArchiveError::ArchiverSpawn
            })?;
        Ok(ArchiveProcess::new(child))
    }
}
