use std::time::Duration;

macro_rules! no_cache {
    () => {
        "Cache-Control: no-cache, no-store, must-revalidate\r\nExpires: 0\r\nPragma: no-cache\r\n"
    };
}

pub const OK_RESPONSE: &str = concat!(
    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n",
    no_cache!(),
    "\r\n"
);
pub const BAD_REQUEST: &str = concat!("HTTP/1.1 400 Bad Request\r\n", no_cache!(), "\r\n");
pub const UNAUTHORIZED: &str = concat!("HTTP/1.1 401 Unauthorized\r\n", no_cache!(), "\r\n");
pub const FORBIDDEN: &str = concat!("HTTP/1.1 403 Forbidden\r\n", no_cache!(), "\r\n");
pub const NOT_FOUND: &str = concat!("HTTP/1.1 404 NOT FOUND\r\n", no_cache!(), "\r\n");
pub const METHOD_NOT_ALLOWED: &str =
    concat!("HTTP/1.1 405 Method Not Allowed\r\n", no_cache!(), "\r\n");
pub const REQUEST_TIMEOUT: &str =
    concat!("HTTP/1.1 408 Request Timeout\r\n", no_cache!(), "\r\n");
pub const INTERNAL_ERROR: &str = concat!("HTTP/1.1 500 INTERNAL ERROR\r\n", no_cache!(), "\r\n");

pub const SESSION_COOKIE: &str = "session";

/// Upper bound on a request body; larger bodies are rejected.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: u64 = 8 * 1024;
/// How long a client may take to send its request.
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7879";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://finance.db?mode=rwc";
pub const DEFAULT_QUOTE_API_URL: &str = "https://cloud.iexapis.com/stable";
pub const DEFAULT_STARTING_CASH: &str = "10000.00";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
pub const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 10;

/// Status line for a successful login, carrying the session cookie.
pub fn ok_with_cookie(cookie: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nSet-Cookie: {}\r\n{}\r\n",
        cookie,
        no_cache!()
    )
}

/// Status line for logout, expiring the session cookie.
pub fn no_content_clearing_cookie() -> String {
    format!(
        "HTTP/1.1 204 No Content\r\nSet-Cookie: {}=; HttpOnly; Path=/; Max-Age=0\r\n{}\r\n",
        SESSION_COOKIE,
        no_cache!()
    )
}
