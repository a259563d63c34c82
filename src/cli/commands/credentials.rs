//! Credential arguments to [`Credentials`].

use anyhow::{bail, Context as _, Result};

use crate::cli::args::CredentialArgs;
use crate::core::types::Credentials;

/// Build credentials, prompting for the passphrase when asked to.
pub fn from_args(args: &CredentialArgs) -> Result<Credentials> {
    let passphrase = if args.ask_passphrase {
        Some(read_passphrase()?)
    } else {
        None
    };

    Ok(Credentials::from_parts(
        args.username.as_deref(),
        args.public_key.clone(),
        args.private_key.clone(),
        passphrase,
    ))
}

/// Masked prompt on the terminal; the prompt goes to stderr so stdout stays
/// a clean report.
fn read_passphrase() -> Result<String> {
    let passphrase =
        rpassword::prompt_password("Key passphrase: ").context("Failed to read passphrase")?;

    if passphrase.is_empty() {
        bail!("Passphrase cannot be empty.");
    }

    Ok(passphrase)
}
