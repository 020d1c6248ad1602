//! # Modulo del cliente
//! Argumentos de entrada, comunicacion con el tracker y los peers, coordinacion de la descarga
//! y escritura de las piezas en el archivo destino.
//!

pub mod download_coordinator;
pub mod entry_files_management;
pub mod peers_communication;
pub mod pieces_assembling_handler;
pub mod tracker_communication;
