//! `.rdp` connection file generation.
//!
//! The native client is driven through a parameter file staged in a fresh
//! temporary directory, named after the address it connects to. Parameters
//! use the `key:type:value` line format with CRLF endings.

use cirrus_core::{Error, Result};
use cirrus_resolver::{Handle, LaunchOptions};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

fn write_parameter<W: Write>(writer: &mut W, key: &str, value: &str) -> Result<()> {
    write!(writer, "{key}:s:{value}\r\n")
        .map_err(|err| Error::Launch(format!("writing RDP file: {err}")))
}

/// Stage a `.rdp` file for the handle and return its path.
///
/// The initial credential is embedded only when not prompting for a login.
///
/// # Errors
///
/// Returns [`Error::IndexOutOfBounds`] when the requested interface does
/// not exist and [`Error::Launch`] for filesystem failures.
pub fn create_rdp_file(handle: &Handle, options: &LaunchOptions) -> Result<PathBuf> {
    let address = handle.ip_address(options.kind, options.index)?.to_string();

    let dir = tempfile::Builder::new()
        .prefix("cirrus-rdp")
        .tempdir()
        .map_err(|err| Error::Launch(format!("creating RDP directory: {err}")))?
        .keep();
    let path = dir.join(format!("{address}.rdp"));

    let mut open_options = OpenOptions::new();
    open_options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        open_options.mode(0o600);
    }
    let mut file = open_options
        .open(&path)
        .map_err(|err| Error::Launch(format!("creating RDP file: {err}")))?;

    write_parameter(&mut file, "full address", &address)?;
    write_parameter(&mut file, "username", &options.username)?;
    if !options.prompt {
        if let Some(password) = handle.admin_password() {
            write_parameter(&mut file, "password", password)?;
        }
    }

    Ok(path)
}
