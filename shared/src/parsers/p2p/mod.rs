//! # Modulo de p2p parsing
//! Modulo usado para estructuras, constantes y funciones relacionadas a codificacion y decodificacion
//! de mensajes PEER TO PEER para su uso en comunicación de este tipo
//!

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod message;
