//! # Modulo compartido
//! Contiene los parsers (P2P, Bencoding y URLencoding) y la interpretacion de archivos .torrent,
//! utilizados por el cliente.

pub mod metadata_analyzer;
pub mod parsers;
pub mod torrent_file_data;
