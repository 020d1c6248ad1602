//! # Modulo general de comunicación entre peers
//! Este modulo contiene todas las definiciones de funciones, constantes y estructuras usadas para
//! realizar la comunicación con peers dados previamente por un tracker.
//!

pub mod handler_communication;
pub mod local_peer_communicator;
pub mod msg_receiver;
pub mod msg_sender;
pub mod piece_downloader;
