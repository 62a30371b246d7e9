/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and validation
/// - [`jwt`]: JWT token generation and validation
/// - [`middleware`]: Turns a Bearer token header into an
///   [`middleware::AuthContext`] for the API's auth layer
/// - [`authorization`]: Role gates over the auth context
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing, role carried as a claim
/// - **Constant-time Comparison**: All verification uses constant-time operations

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
