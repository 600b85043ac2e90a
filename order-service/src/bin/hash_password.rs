//! Print an argon2 hash for seeding the `users` table.
//!
//! Usage: `hash-password <password>`, or pipe the password on stdin.

use order_service::utils::{hash_password, Password};
use std::io::BufRead;

fn main() -> anyhow::Result<()> {
    let password = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }

    let hash = hash_password(&Password::new(password))?;
    println!("{}", hash.as_str());

    Ok(())
}
