//! # Modulo general de Parsers
//! Este modulo contiene todas las definiciones de funciones, constantes y estructuras usadas para
//! realizar Encoding y Decoding de los distintos formatos (Comunicacion P2P, Bencoding y URLencoding)

pub mod bencoding;
pub mod p2p;
pub mod url_encoder;
