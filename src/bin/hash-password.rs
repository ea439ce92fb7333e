//! Prints a bcrypt hash for the first admin account's ADMIN_HASH_PASSWORD.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
        std::process::exit(1);
    });

    if password.chars().count() < tesisat_backend::services::users::MIN_PASSWORD_LEN {
        eprintln!(
            "Password must be at least {} characters",
            tesisat_backend::services::users::MIN_PASSWORD_LEN
        );
        std::process::exit(1);
    }

    let cost = env::args()
        .nth(2)
        .and_then(|c| c.parse().ok())
        .or_else(|| env::var("BCRYPT_COST").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(DEFAULT_COST);

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env together with ADMIN_EMAIL:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
