//! # Modulo de las constantes
//! Este modulo contiene todas las constantes utilizadas en el modulo de Bencoding
//! , tanto encoding como decoding

pub const TWO_POINTS: u8 = b':';
pub const CHAR_I: u8 = b'i';
pub const CHAR_L: u8 = b'l';
pub const CHAR_D: u8 = b'd';
pub const CHAR_E: u8 = b'e';
pub const CHAR_MINUS: u8 = b'-';
pub const CHAR_ZERO: u8 = b'0';
