//! # Modulo de constantes
//! Constantes utiles para uso en comunicacion http

pub const TWO: usize = 2;
pub const THREE: usize = 3;
pub const FOUR: usize = 4;

pub const LAST_SLASH: u8 = b'/';
pub const TWO_POINTS: u8 = b':';
pub const QUESTION_MARK: char = '?';
pub const AMPERSAND: char = '&';
pub const HTTP_END: &[u8; THREE] = b"://";
pub const END_LINE: &[u8; TWO] = b"\r\n";
pub const DOUBLE_END_LINE: &[u8; FOUR] = b"\r\n\r\n";

pub const INIT_MSG: &str = "GET ";
pub const INFO_HASH: &str = "info_hash=";
pub const PEER_ID: &str = "&peer_id=";
pub const PORT: &str = "&port=";
pub const UPLOADED: &str = "&uploaded=";
pub const DOWNLOADED: &str = "&downloaded=";
pub const LEFT: &str = "&left=";
pub const COMPACT: &str = "&compact=";
pub const EVENT: &str = "&event=";
pub const HTTP: &str = " HTTP/1.0\r\n";
pub const HOST: &str = "Host: ";
pub const MSG_ENDING: &str = "\r\n\r\n";

pub const HTTP_VERSIONS: [&str; 2] = ["HTTP/1.0", "HTTP/1.1"];
pub const HTTPS_PROTOCOL: &str = "https";
pub const PORT_HTTP: u16 = 80;
pub const PORT_HTTPS: u16 = 443;
pub const DEFAULT_PATH: &str = "/";
pub const STARTED: &str = "started";
pub const COMPACT_VALUE: u8 = 1;

pub const SECS_TRACKER_TIMEOUT: u64 = 15;
