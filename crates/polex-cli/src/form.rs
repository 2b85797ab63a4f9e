//! # Form Attachments
//!
//! `form attach|download|download-for|list`. Downloads never overwrite:
//! an underscore is appended to the stored name until it is free.

use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use polex_core::{ExceptionId, FormFileId};
use polex_state::{FormFile, MAX_FORM_FILE_BYTES};
use polex_store::annotations;

use crate::{render, Session};

/// Arguments for `form`.
#[derive(Args, Debug)]
pub struct FormArgs {
    #[command(subcommand)]
    pub command: FormCommand,
}

#[derive(Subcommand, Debug)]
pub enum FormCommand {
    /// Attach a file to an exception.
    Attach {
        /// Exception ID.
        id: i64,
        /// File to attach; only its base name is stored.
        file: PathBuf,
    },

    /// Save one attachment into a directory.
    Download {
        /// Form file ID.
        file_id: i64,
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Save every attachment of an exception into a directory.
    DownloadFor {
        /// Exception ID.
        id: i64,
        /// Directory to write into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// List attachments, for one exception or all of them.
    List {
        /// Exception ID.
        id: Option<i64>,
    },
}

pub async fn run_form(args: &FormArgs, session: &Session) -> Result<u8> {
    let pool = &session.pool;
    match &args.command {
        FormCommand::Attach { id, file } => {
            let (file_name, contents) = read_form(file)?;
            let file_id = annotations::attach(pool, ExceptionId(*id), &file_name, &contents).await?;
            println!("OK: attached {file_name} to exception {id} as form {file_id}");
        }
        FormCommand::Download { file_id, dir } => {
            let file = annotations::get_file(pool, FormFileId(*file_id)).await?;
            let path = save(&file, dir)?;
            println!("OK: wrote {}", path.display());
        }
        FormCommand::DownloadFor { id, dir } => {
            let files = annotations::files_for_exception(pool, ExceptionId(*id)).await?;
            if files.is_empty() {
                println!("Exception {id} has no attachments.");
            }
            for info in files {
                let file = annotations::get_file(pool, info.id).await?;
                let path = save(&file, dir)?;
                println!("OK: wrote {}", path.display());
            }
        }
        FormCommand::List { id } => {
            let files = match id {
                Some(id) => annotations::files_for_exception(pool, ExceptionId(*id)).await?,
                None => annotations::list_files(pool).await?,
            };
            print!("{}", render::file_table(&files));
        }
    }
    Ok(0)
}

/// Read a file for attachment, returning its base name and contents.
pub fn read_form(path: &Path) -> Result<(String, Vec<u8>)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no usable file name", path.display()))?
        .to_owned();

    let size = std::fs::metadata(path)
        .with_context(|| format!("could not stat {}", path.display()))?
        .len();
    if size > MAX_FORM_FILE_BYTES as u64 {
        bail!(
            "{} is {size} bytes; attachments are limited to {MAX_FORM_FILE_BYTES} bytes",
            path.display()
        );
    }

    let contents =
        std::fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
    Ok((file_name, contents))
}

/// Write `file` into `dir` under the first free variant of its name.
/// Stored names that are not bare file names are refused.
fn save(file: &FormFile, dir: &Path) -> Result<PathBuf> {
    let bare = Path::new(&file.file_name).file_name() == Some(OsStr::new(&file.file_name));
    if !bare || file.file_name.contains('\\') {
        bail!(
            "form {} has unsafe file name {:?}; not writing it",
            file.id,
            file.file_name
        );
    }
    let mut path = dir.join(&file.file_name);
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut out) => {
                out.write_all(&file.contents)
                    .with_context(|| format!("could not write {}", path.display()))?;
                tracing::debug!(form_file_id = %file.id, path = %path.display(), "form saved");
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let mut name = path.into_os_string();
                name.push("_");
                path = PathBuf::from(name);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("could not create {}", path.display()));
            }
        }
    }
}
