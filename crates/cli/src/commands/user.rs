//! API user management commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli user create -e shopper@example.com
//! ```
//!
//! The generated token is printed once. Only its SHA-256 digest is stored.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bazaar_storefront::db::UserRepository;
use bazaar_storefront::middleware::hash_token;

use super::{CommandError, connect};

/// Prefix marking Bazaar API tokens.
const TOKEN_PREFIX: &str = "bzr_";

/// Create a user and print their API token.
pub async fn create(email: &str) -> Result<(), CommandError> {
    validate_email(email)?;

    let pool = connect().await?;
    let token = generate_token();

    tracing::info!("Creating user: {email}");
    let user = UserRepository::new(&pool)
        .create(email, &hash_token(&token))
        .await?;

    tracing::info!(user_id = %user.id, "User created");

    #[allow(clippy::print_stdout)]
    {
        println!("User:  {} ({})", user.email, user.id);
        println!("Token: {token}");
        println!();
        println!("Store this token now; it cannot be shown again.");
    }

    Ok(())
}

fn validate_email(email: &str) -> Result<(), CommandError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CommandError::InvalidEmail(email.to_owned())),
    }
}

/// 32 random bytes, URL-safe base64, with a recognizable prefix.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("shopper@example.com").is_ok());
        assert!(validate_email("shopper").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("shopper@localhost").is_err());
    }

    #[test]
    fn test_generate_token() {
        let a = generate_token();
        let b = generate_token();
        assert!(a.starts_with(TOKEN_PREFIX));
        assert_eq!(a.len(), TOKEN_PREFIX.len() + 43);
        assert_ne!(a, b);
    }
}
