/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: Access/refresh token issuing and validation
/// - [`middleware`]: Axum middleware that turns a Bearer token into an
///   [`middleware::AuthContext`] and gates admin-only routes
///
/// # Example
///
/// ```no_run
/// use atelier_shared::auth::password::{hash_password, verify_password};
/// use atelier_shared::auth::jwt::{create_token, Claims, TokenType};
/// use atelier_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Gallery#2024")?;
/// assert!(verify_password("Gallery#2024", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Admin, TokenType::Access);
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes!")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
