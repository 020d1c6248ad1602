//! # Modulo de comunicacion con el tracker
//! Envio del announce por HTTP(S) e interpretacion de la respuesta.

pub mod constants;
pub mod http_handler;
