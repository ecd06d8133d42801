/// HTTP middleware
///
/// - `security`: Security response headers (CSP, HSTS, framing)

pub mod security;
