pub const NUM_BITS_ON_A_BYTE: usize = 8;

pub const NEEDED_NUM_OF_BYTES_TO_CONCATENATE: usize = 4;
pub const NUM_OF_BYTES_LENGHT_PREFIX: usize = 4;
pub const NEEDED_NUM_OF_BYTES_FOR_ID: usize = 1;

// Largo maximo aceptado para un mensaje (sin contar el length prefix). 1 MiB.
pub const MAX_P2P_MSG_LENGTH: u32 = 1 << 20;

pub const PSTRLEN_VALUE_HANDSHAKE: u8 = 19;
pub const PSTR_STRING_HANDSHAKE: &str = "BitTorrent protocol";
pub const NUM_OF_RESERVED_BYTES_HANDSHAKE: usize = 8;
pub const NUM_OF_BYTES_SHA1: usize = 20;
pub const NUM_OF_BYTES_PEER_ID: usize = 20;
/// reserved + info_hash + peer_id
pub const NUM_OF_FIXED_BYTES_HANDSHAKE: usize =
    NUM_OF_RESERVED_BYTES_HANDSHAKE + NUM_OF_BYTES_SHA1 + NUM_OF_BYTES_PEER_ID;

pub const ID_CHOKE: u8 = 0;
pub const ID_UNCHOKE: u8 = 1;
pub const ID_INTERESTED: u8 = 2;
pub const ID_NOT_INTERESTED: u8 = 3;
pub const ID_HAVE: u8 = 4;
pub const ID_BITFIELD: u8 = 5;
pub const ID_REQUEST: u8 = 6;
pub const ID_PIECE: u8 = 7;
pub const ID_CANCEL: u8 = 8;

pub const NUM_OF_BYTES_HAVE_PAYLOAD: usize = 4;
pub const NUM_OF_BYTES_REQUEST_PAYLOAD: usize = 12;
pub const NUM_OF_BYTES_PIECE_HEADER: usize = 8;
