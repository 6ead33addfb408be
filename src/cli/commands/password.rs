use serde_json::json;

use crate::auth::PasswordHasher;
use crate::cli::{utils::output_success, OutputFormat};

pub fn hash(plaintext: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let digest = PasswordHasher::new()
        .hash(plaintext)
        .map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;

    match output_format {
        OutputFormat::Json => output_success(output_format, "Password hashed", Some(json!({ "digest": digest }))),
        OutputFormat::Text => {
            println!("{digest}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_command_succeeds() {
        assert!(hash("secret123", OutputFormat::Text).is_ok());
        assert!(hash("secret123", OutputFormat::Json).is_ok());
    }
}
