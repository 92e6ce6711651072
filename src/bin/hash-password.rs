//! Prints a bcrypt hash for the studio admin password.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD>");
        std::process::exit(1);
    });

    if password.trim().len() < 8 {
        eprintln!("Refusing to hash a password shorter than 8 characters.");
        std::process::exit(1);
    }

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("\nCost     : {}", DEFAULT_COST);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into the studio .env:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
