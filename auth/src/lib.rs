//! Authentication primitives for the LMS backend.
//!
//! Provides the two stateless leaves of the authentication core:
//! - Password hashing (Argon2id)
//! - Session token issuance and verification (HS256 JWT)
//!
//! The login state machine itself lives in the service crate; this crate
//! knows nothing about HTTP or storage.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let digest = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &digest));
//! assert!(!hasher.verify("wrong_password", &digest));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::{Role, TokenCodec};
//!
//! let codec = TokenCodec::new(b"secret_key_at_least_32_bytes_long!", 24);
//! let token = codec.issue("account-id", Role::Student).unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.sub, "account-id");
//! assert_eq!(claims.role, Role::Student);
//! ```

pub mod password;
pub mod role;
pub mod token;

// Re-export commonly used items
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use role::Role;
pub use role::RoleParseError;
pub use token::SessionClaims;
pub use token::TokenCodec;
pub use token::TokenError;
