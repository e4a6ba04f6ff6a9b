//! Prints a `[[users]]` entry for the chatgate config.
//!
//! Usage: `hash_password <email> [name]`, password read from stdin.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(email) = args.next() else {
        bail!("usage: hash_password <email> [name]");
    };
    let name = args.next().unwrap_or_else(|| email.clone());

    eprint!("Enter password for {email}: ");
    io::stderr().flush()?;

    let mut password = String::new();
    io::stdin()
        .lock()
        .read_line(&mut password)
        .context("reading password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);

    if password.is_empty() {
        bail!("Password cannot be empty");
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    println!("[[users]]");
    println!("email = {email:?}");
    println!("name = {name:?}");
    println!("password_hash = \"{hash}\"");
    Ok(())
}
