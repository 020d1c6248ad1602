//! # Modulo general del cliente de descarga
//! Contiene el manejo del .torrent, el cliente (tracker, peers y ensamblado de piezas),
//! los datos usados durante la descarga y el logger en archivos.
//!

pub mod client;
pub mod data;
pub mod logger;
pub mod torrent_handler;
