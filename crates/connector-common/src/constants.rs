//! System-wide constants and default values.

/// Default path of the daemon's unix-domain socket.
pub const DEFAULT_SOCKET_PATH: &str = "/run/csi-tool/connector/connector.sock";

/// Environment variable holding the comma-separated peer sockets to watch.
pub const WATCHDOG_SOCKETS_ENV: &str = "WATCHDOG_SOCKETS_PATH";

/// Seconds between two watchdog rounds.
pub const DEFAULT_WATCHDOG_INTERVAL_SECS: u64 = 10;

/// Consecutive failed probes after which a peer socket counts as dead.
pub const DEFAULT_WATCHDOG_THRESHOLD: u32 = 6;

/// Upper bound on concurrently handled connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 64;

/// Largest accepted value for the connection cap.
pub const MAX_CONNECTIONS_LIMIT: usize = 65_536;

/// Seconds a client may stay silent before its connection is dropped.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Largest accepted request payload in bytes.
pub const MAX_REQUEST_BYTES: usize = 2048;

/// Delimiter between request tokens on the wire.
///
/// NUL cannot appear inside a command-line argument, the same reasoning as
/// `xargs -0`.
pub const TOKEN_DELIMITER: &str = "\0";

/// Prefix of every successful response.
pub const SUCCESS_PREFIX: &str = "Success:";

/// Prefix of every failed response.
pub const FAIL_PREFIX: &str = "Fail: ";

/// Launcher prefixes a mount command may start with, longest first.
pub const LAUNCHER_PREFIXES: &[&[&str]] = &[
    &["systemd-run", "--scope", "--", "/usr/local/bin/ossfs"],
    &["systemd-run", "--scope", "--", "ossfs"],
    &["ossfs"],
];

/// Literal prefix of the URL-bearing option.
pub const URL_OPTION_MARKER: &str = "-ourl=";

/// Standalone option flag that takes the next token as its value.
pub const OPTION_FLAG: &str = "-o";

/// Boolean flags accepted without a value.
pub const BOOLEAN_FLAGS: &[&str] = &["-s", "-d", "--debug"];

/// Application name used in logs.
pub const APP_NAME: &str = "csiplugin-connector";
