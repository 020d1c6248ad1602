//! # Modulo de Bencoding
//! Contiene la codificacion y decodificacion del formato Bencoding, trabajando directamente sobre
//! bytes ya que los strings bencodeados (por ejemplo el campo pieces) no son necesariamente UTF-8.

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod values;
